pub mod source;

/// Parse Ruby source bytes using Prism.
///
/// This must be called on the thread that will use the result, since
/// `ParseResult` is `!Send + !Sync`.
pub fn parse_source(source: &[u8]) -> ruby_prism::ParseResult<'_> {
    ruby_prism::parse(source)
}
