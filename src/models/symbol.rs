use super::{BitMatrix, ECLevel, MaskPattern, Version};

/// An immutable QR symbol: the module grid plus the parameters it was built with.
///
/// The grid is always `version.size()` modules square. Only the encoder and
/// the grid sampler construct values of this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolMatrix {
    version: Version,
    ec_level: ECLevel,
    mask: MaskPattern,
    modules: BitMatrix,
}

impl SymbolMatrix {
    pub(crate) fn new(
        version: Version,
        ec_level: ECLevel,
        mask: MaskPattern,
        modules: BitMatrix,
    ) -> Self {
        debug_assert_eq!(modules.width(), version.size());
        debug_assert_eq!(modules.height(), version.size());
        Self {
            version,
            ec_level,
            mask,
            modules,
        }
    }

    /// Symbol version
    pub fn version(&self) -> Version {
        self.version
    }

    /// Error correction level
    pub fn ec_level(&self) -> ECLevel {
        self.ec_level
    }

    /// Mask pattern applied to the data area
    pub fn mask(&self) -> MaskPattern {
        self.mask
    }

    /// Side length in modules
    pub fn size(&self) -> usize {
        self.modules.width()
    }

    /// Module at column `x`, row `y` (`true` = dark)
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.modules.get(x, y)
    }

    /// The module grid
    pub fn modules(&self) -> &BitMatrix {
        &self.modules
    }

    /// Render as text, one row per line (`#` dark, `.` light)
    pub fn to_text(&self) -> String {
        let size = self.size();
        let mut out = String::with_capacity(size * (size + 1));
        for y in 0..size {
            for x in 0..size {
                out.push(if self.get(x, y) { '#' } else { '.' });
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use crate::encoder::encode;
    use crate::models::ECLevel;

    #[test]
    fn test_text_rows_match_modules() {
        let symbol = encode(b"text", ECLevel::L).unwrap();
        let text = symbol.to_text();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows.len(), 21);
        assert!(rows.iter().all(|row| row.len() == 21));
        // finder corner and separator
        assert!(rows[0].starts_with("#######."));
        assert_eq!(rows[3].as_bytes()[3], b'#');
        assert_eq!(rows[1].as_bytes()[1], b'.');
    }
}
