use crate::identity::NoteIdentity;
use yansi::Paint;

type Rgb = (u8, u8, u8);

/// What a piece of output text is, for coloring.
#[derive(Debug, Clone, Copy)]
pub enum Role {
    Header,
    Muted,
    Date,
    Title,
    Match,
}

/// Catppuccin-flavoured colors for each role, plus the rotation used for
/// hashtags.
pub struct Theme {
    header: Rgb,
    muted: Rgb,
    date: Rgb,
    title: Rgb,
    matched: Rgb,
    tags: &'static [Rgb],
}

impl Theme {
    pub const CATPPUCCIN: Self = Self {
        header: (148, 226, 213),
        muted: (108, 112, 134),
        date: (137, 180, 250),
        title: (249, 226, 175),
        matched: (243, 139, 168),
        tags: &[
            (137, 180, 250),
            (166, 227, 161),
            (249, 226, 175),
            (245, 194, 231),
            (148, 226, 213),
            (198, 160, 246),
            (255, 214, 165),
            (183, 189, 248),
        ],
    };

    fn color(&self, role: Role) -> Rgb {
        match role {
            Role::Header => self.header,
            Role::Muted => self.muted,
            Role::Date => self.date,
            Role::Title => self.title,
            Role::Match => self.matched,
        }
    }

    /// Same tag, same color, on every run.
    fn tag_color(&self, tag: &str) -> Rgb {
        let h = tag.bytes().fold(5381u64, |h, b| h.wrapping_mul(33) ^ u64::from(b));
        self.tags[(h % self.tags.len() as u64) as usize]
    }
}

/// Terminal styling for host output. With color off every method returns
/// its input unchanged.
pub struct FormatContext {
    use_color: bool,
    theme: Theme,
}

impl FormatContext {
    pub fn new(use_color: bool) -> Self {
        Self { use_color, theme: Theme::CATPPUCCIN }
    }

    /// Color unless `NO_COLOR` is set.
    pub fn from_env() -> Self {
        Self::new(std::env::var_os("NO_COLOR").is_none())
    }

    fn rgb(&self, text: &str, (r, g, b): Rgb, bold: bool) -> String {
        match (self.use_color, bold) {
            (false, _) => text.to_string(),
            (true, false) => text.rgb(r, g, b).to_string(),
            (true, true) => text.rgb(r, g, b).bold().to_string(),
        }
    }

    pub fn paint(&self, text: &str, role: Role) -> String {
        self.rgb(text, self.theme.color(role), matches!(role, Role::Header))
    }

    pub fn identity(&self, identity: &NoteIdentity) -> String {
        let role = match identity {
            NoteIdentity::Dated(_) => Role::Date,
            NoteIdentity::Titled(_) => Role::Title,
            NoteIdentity::Unknown(_) => Role::Muted,
        };
        self.paint(&identity.to_string(), role)
    }

    pub fn tag(&self, tag: &str) -> String {
        self.rgb(tag, self.theme.tag_color(tag), true)
    }

    /// Color every case-insensitive occurrence of `needle` in `line`.
    /// Only ASCII needles are located.
    pub fn highlight(&self, line: &str, needle: Option<&str>) -> String {
        let needle = match needle {
            Some(n) if self.use_color && !n.is_empty() && n.is_ascii() => n.as_bytes(),
            _ => return line.to_string(),
        };
        let bytes = line.as_bytes();
        let mut out = String::with_capacity(line.len());
        let mut start = 0;
        let mut i = 0;
        while i + needle.len() <= bytes.len() {
            let end = i + needle.len();
            if bytes[i..end].eq_ignore_ascii_case(needle)
                && line.is_char_boundary(i)
                && line.is_char_boundary(end)
            {
                out.push_str(&line[start..i]);
                out.push_str(&self.paint(&line[i..end], Role::Match));
                start = end;
                i = end;
            } else {
                i += 1;
            }
        }
        out.push_str(&line[start..]);
        out
    }
}
