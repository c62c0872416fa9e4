/// Knobs for how strictly frame states check the values going through them
///
/// Settings are chosen when the entry frame of a compilation is created and then inherited by
/// every frame copied from it.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Settings {
    /// Check that values pushed, popped, loaded and stored have the expected kind
    ///
    /// Structural checks (stack bounds, high words of wide values, lock underflow) cannot be
    /// turned off. Even when this is enabled, frames in unsafe mode skip kind checks.
    pub check_kinds: bool,

    /// Allow values of word-like kinds (machine words and `jsr` return addresses)
    ///
    /// Code compiled for the VM itself needs these. Application code can turn this off to catch
    /// them sneaking in, since they disable kind checking for the rest of the method.
    pub allow_word_kinds: bool,
}

impl Settings {
    /// Settings used by frames created without explicit settings
    ///
    /// Building with the `trusted` feature turns off kind checks.
    pub const DEFAULT: Settings = Settings {
        check_kinds: !cfg!(feature = "trusted"),
        allow_word_kinds: true,
    };

    /// Settings that check everything
    pub const STRICT: Settings = Settings {
        check_kinds: true,
        allow_word_kinds: false,
    };
}

impl Default for Settings {
    fn default() -> Self {
        Settings::DEFAULT
    }
}
