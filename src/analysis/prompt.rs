use crate::signals::Signal;

/// Prompt sent to the text-generation model for a set of active signals.
///
/// One line per signal: `- SYMBOL (TF): RULE (RSI: x, VWAP Gap: y%)`.
pub fn build_prompt(signals: &[Signal]) -> String {
    let lines: Vec<String> = signals
        .iter()
        .map(|s| {
            format!(
                "- {} ({}): {} (RSI: {}, VWAP Gap: {}%)",
                s.symbol, s.timeframe, s.rule, s.details.rsi, s.details.vwap_gap_percent
            )
        })
        .collect();

    format!(
        "You are a senior quantitative analyst for a crypto trading desk.\n\
         Analyze the following active trading signals and provide a brief, insightful market summary.\n\
         Focus on potential opportunities and risks. Keep the summary concise (2-3 paragraphs).\n\
         \n\
         Active Signals:\n\
         {}\n\
         \n\
         Your analysis:\n",
        lines.join("\n")
    )
}
