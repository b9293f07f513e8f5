/// 24-bit color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Muted fill used for every out-of-season tree
    pub const MUTED: Rgb = Rgb(0xa0, 0xa0, 0xa0);
}

/// Glyph shape class
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Glyph {
    Citrus,
    Stone,
    Fig,
    Berry,
    Olive,
    Round,
    Crowned,
    Pome,
    Nut,
    Tree,
    Locator,
    Pin,
}

impl Glyph {
    /// Terminal character drawn for this glyph
    pub fn symbol(self) -> char {
        match self {
            Glyph::Citrus => '✺',
            Glyph::Stone => '◉',
            Glyph::Fig => '❦',
            Glyph::Berry => '⁂',
            Glyph::Olive => '⬮',
            Glyph::Round => '●',
            Glyph::Crowned => '♛',
            Glyph::Pome => '♣',
            Glyph::Nut => '◆',
            Glyph::Tree => '♠',
            Glyph::Locator => '◎',
            Glyph::Pin => '▼',
        }
    }
}

/// Everything the renderer needs to draw one marker
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IconDescriptor {
    pub glyph: Glyph,
    pub fill: Rgb,
    /// Radial halo color; only in-season trees glow
    pub glow: Option<Rgb>,
    /// Continuous "breathing" pulse
    pub animated: bool,
}

/// Fruit category as laid out in the type table
struct Category {
    glyph: Glyph,
    fill: Rgb,
    glow: Rgb,
}

const GOLD: Rgb = Rgb(255, 204, 0);
const PURPLE: Rgb = Rgb(124, 58, 237);
const GREEN: Rgb = Rgb(101, 163, 13);
const RED: Rgb = Rgb(220, 38, 38);
const BROWN: Rgb = Rgb(146, 64, 14);
const ORANGE: Rgb = Rgb(249, 115, 22);

const DEFAULT_CATEGORY: Category = Category {
    glyph: Glyph::Tree,
    fill: Rgb(0x34, 0xc7, 0x59),
    glow: Rgb(52, 199, 89),
};

fn category(kind: &str) -> Category {
    let (glyph, fill, glow) = match kind.trim().to_ascii_lowercase().as_str() {
        "lemon" => (Glyph::Citrus, Rgb(0xff, 0xcc, 0x00), GOLD),
        "loquat" => (Glyph::Stone, Rgb(0xf5, 0x9e, 0x0b), GOLD),
        "fig" => (Glyph::Fig, Rgb(0x55, 0x3c, 0x9a), PURPLE),
        "mulberry" => (Glyph::Berry, Rgb(0x7e, 0x22, 0xce), PURPLE),
        "plum" => (Glyph::Stone, Rgb(0x7c, 0x3a, 0xed), PURPLE),
        "olive" => (Glyph::Olive, Rgb(0x84, 0xcc, 0x16), GREEN),
        "guava" => (Glyph::Round, Rgb(0x65, 0xa3, 0x0d), GREEN),
        "avocado" => (Glyph::Round, Rgb(0x3f, 0x62, 0x12), GREEN),
        "pomegranate" => (Glyph::Crowned, Rgb(0xdc, 0x26, 0x26), RED),
        "apple" => (Glyph::Pome, Rgb(0xdc, 0x26, 0x26), RED),
        "pecan" => (Glyph::Nut, Rgb(0x92, 0x40, 0x0e), BROWN),
        "chestnut" => (Glyph::Nut, Rgb(0x85, 0x4d, 0x0e), BROWN),
        "orange" => (Glyph::Citrus, Rgb(0xf9, 0x73, 0x16), ORANGE),
        "tangerine" => (Glyph::Citrus, Rgb(0xea, 0x58, 0x0c), ORANGE),
        _ => return DEFAULT_CATEGORY,
    };
    Category { glyph, fill, glow }
}

/// Derive the icon for a tree of the given type.
///
/// Season mutes the fill and toggles the glow and breathing animation. The
/// glyph never changes with season.
pub fn icon_for(kind: &str, in_season: bool) -> IconDescriptor {
    let category = category(kind);
    if in_season {
        IconDescriptor {
            glyph: category.glyph,
            fill: category.fill,
            glow: Some(category.glow),
            animated: true,
        }
    } else {
        IconDescriptor {
            glyph: category.glyph,
            fill: Rgb::MUTED,
            glow: None,
            animated: false,
        }
    }
}

/// Locator for the viewer's position: blue for a real fix, slate for the
/// fallback center
pub fn user_icon(is_default: bool) -> IconDescriptor {
    IconDescriptor {
        glyph: Glyph::Locator,
        fill: if is_default {
            Rgb(0x94, 0xa3, 0xb8)
        } else {
            Rgb(0x3b, 0x82, 0xf6)
        },
        glow: None,
        animated: false,
    }
}

/// Red pulsing pin for the point being contributed
pub fn selection_icon() -> IconDescriptor {
    IconDescriptor {
        glyph: Glyph::Pin,
        fill: Rgb(0xff, 0x3b, 0x30),
        glow: None,
        animated: true,
    }
}
