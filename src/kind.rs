use crate::util::Width;
use std::fmt;

/// Category of a value held in a frame slot
///
/// These are coarser than JVM field types: `boolean`, `byte`, `char` and `short` all live on the
/// stack as [`Kind::Int`]. Two additional kinds are not JVM types at all:
///
///   - [`Kind::Word`] is a machine word, used by VM-internal code that manipulates raw pointers
///   - [`Kind::Jsr`] is the return address pushed by `jsr`/`jsr_w`
///
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Kind {
    Int,
    Long,
    Float,
    Double,
    Object,
    Word,
    Jsr,
    Void,
}

impl Kind {
    /// Every kind, in declaration order
    pub const ALL: [Kind; 8] = [
        Kind::Int,
        Kind::Long,
        Kind::Float,
        Kind::Double,
        Kind::Object,
        Kind::Word,
        Kind::Jsr,
        Kind::Void,
    ];

    /// Number of frame slots a value of this kind occupies
    pub fn slot_width(self) -> usize {
        match self {
            Kind::Long | Kind::Double => 2,
            Kind::Void => 0,
            Kind::Int | Kind::Float | Kind::Object | Kind::Word | Kind::Jsr => 1,
        }
    }

    /// Does this kind take two slots?
    pub fn is_wide(self) -> bool {
        self.slot_width() == 2
    }

    /// Is this a kind that carries no verifiable type?
    ///
    /// Pushing one of these puts the frame into unsafe mode, after which kind mismatches stop
    /// being reported.
    pub fn is_word_like(self) -> bool {
        matches!(self, Kind::Word | Kind::Jsr)
    }

    /// Is this a kind the JVM itself knows about?
    pub fn is_jvm_kind(self) -> bool {
        !matches!(self, Kind::Word | Kind::Void)
    }

    /// Is this the kind of a method that returns nothing? (never the kind of a slot)
    pub fn is_void(self) -> bool {
        self == Kind::Void
    }

    /// Single character mnemonic, matching the prefixes of the typed JVM instructions where one
    /// exists (`iload`, `lload`, `aload`, ...)
    pub fn type_char(self) -> char {
        match self {
            Kind::Int => 'i',
            Kind::Long => 'j',
            Kind::Float => 'f',
            Kind::Double => 'd',
            Kind::Object => 'a',
            Kind::Word => 'w',
            Kind::Jsr => 'r',
            Kind::Void => 'v',
        }
    }
}

impl Width for Kind {
    fn width(&self) -> usize {
        self.slot_width()
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Int => "int",
            Kind::Long => "long",
            Kind::Float => "float",
            Kind::Double => "double",
            Kind::Object => "object",
            Kind::Word => "word",
            Kind::Jsr => "jsr",
            Kind::Void => "void",
        };
        f.write_str(name)
    }
}
