/// Instruction sent when the user adds no text of their own.
pub const DEFAULT_PROMPT: &str = "Replace the main subject of this image with a photorealistic caracal cat \
in the same lighting and style, seamlessly integrated.";

/// Appends the user's words (verbatim, single-space joined) to [`DEFAULT_PROMPT`].
pub fn build_prompt(args: &[String]) -> String {
    let user_ctx = args.join(" ");
    if user_ctx.is_empty() {
        DEFAULT_PROMPT.to_string()
    } else {
        format!("{} {}", DEFAULT_PROMPT, user_ctx)
    }
}
