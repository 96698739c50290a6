//! Number format types

/// Number format attached to a cell
///
/// The pattern string (see [`NumberFormat::format_string`]) is the display
/// descriptor handed to value rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NumberFormat {
    /// General format (default)
    #[default]
    General,

    /// Built-in format by ID
    BuiltIn(u32),

    /// Custom format string
    Custom(String),
}

impl NumberFormat {
    // Built-in format IDs
    /// 0 - General
    pub const ID_GENERAL: u32 = 0;
    /// 3 - #,##0
    pub const ID_NUMBER_SEP: u32 = 3;
    /// 4 - #,##0.00
    pub const ID_NUMBER_SEP_DEC2: u32 = 4;
    /// 9 - 0%
    pub const ID_PERCENT_INT: u32 = 9;
    /// 10 - 0.00%
    pub const ID_PERCENT_DEC2: u32 = 10;
    /// 11 - 0.00E+00
    pub const ID_SCIENTIFIC: u32 = 11;
    /// 14 - mm-dd-yy
    pub const ID_DATE_SHORT: u32 = 14;
    /// 22 - m/d/yy h:mm
    pub const ID_DATETIME: u32 = 22;
    /// 49 - @
    pub const ID_TEXT: u32 = 49;

    /// Create a number format from a format string
    ///
    /// `"General"` (any case) and the empty string map to [`NumberFormat::General`].
    pub fn from_string<S: Into<String>>(format: S) -> Self {
        let format = format.into();
        if format.is_empty() || format.eq_ignore_ascii_case("general") {
            NumberFormat::General
        } else {
            NumberFormat::Custom(format)
        }
    }

    /// Create a built-in format by ID
    pub fn from_id(id: u32) -> Self {
        if id == Self::ID_GENERAL {
            NumberFormat::General
        } else {
            NumberFormat::BuiltIn(id)
        }
    }

    /// Whether this is the generic/default pattern
    pub fn is_general(&self) -> bool {
        self.format_string() == "General"
    }

    /// Get the format string
    pub fn format_string(&self) -> &str {
        match self {
            NumberFormat::General => "General",
            NumberFormat::BuiltIn(id) => Self::builtin_format_string(*id),
            NumberFormat::Custom(s) => s,
        }
    }

    /// Get built-in format string by ID
    fn builtin_format_string(id: u32) -> &'static str {
        match id {
            1 => "0",
            2 => "0.00",
            3 => "#,##0",
            4 => "#,##0.00",
            5 => "$#,##0_);($#,##0)",
            6 => "$#,##0_);[Red]($#,##0)",
            7 => "$#,##0.00_);($#,##0.00)",
            8 => "$#,##0.00_);[Red]($#,##0.00)",
            9 => "0%",
            10 => "0.00%",
            11 => "0.00E+00",
            12 => "# ?/?",
            13 => "# ??/??",
            14 => "mm-dd-yy",
            15 => "d-mmm-yy",
            16 => "d-mmm",
            17 => "mmm-yy",
            18 => "h:mm AM/PM",
            19 => "h:mm:ss AM/PM",
            20 => "h:mm",
            21 => "h:mm:ss",
            22 => "m/d/yy h:mm",
            37 => "#,##0 ;(#,##0)",
            38 => "#,##0 ;[Red](#,##0)",
            39 => "#,##0.00;(#,##0.00)",
            40 => "#,##0.00;[Red](#,##0.00)",
            45 => "mm:ss",
            46 => "[h]:mm:ss",
            47 => "mmss.0",
            48 => "##0.0E+0",
            49 => "@",
            _ => "General",
        }
    }

    /// Check if this is a date/time format
    ///
    /// Quoted literals, escaped characters and bracketed sections (colors,
    /// locales, conditions) are ignored before looking for date tokens, so
    /// `"#,##0 "days""` or `[Red]0.00` are not treated as dates. Elapsed-time
    /// sections such as `[h]` still count.
    pub fn is_date_format(&self) -> bool {
        match self {
            NumberFormat::General => false,
            NumberFormat::BuiltIn(id) => matches!(id, 14..=22 | 45..=47),
            NumberFormat::Custom(s) => {
                let lower = s.to_lowercase();
                if lower.contains("[h]") || lower.contains("[m]") || lower.contains("[s]") {
                    return true;
                }
                let tokens = date_relevant_chars(&lower);
                tokens
                    .chars()
                    .any(|c| matches!(c, 'y' | 'm' | 'd' | 'h' | 's'))
            }
        }
    }

}

/// Strip the parts of a format string that never carry date tokens
fn date_relevant_chars(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                for inner in chars.by_ref() {
                    if inner == '"' {
                        break;
                    }
                }
            }
            '[' => {
                for inner in chars.by_ref() {
                    if inner == ']' {
                        break;
                    }
                }
            }
            '\\' | '_' | '*' => {
                chars.next();
            }
            _ => out.push(c),
        }
    }
    out
}
