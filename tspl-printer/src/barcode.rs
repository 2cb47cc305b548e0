//! Linear barcode encoding
//!
//! Only Code 128 (subset B) is needed by the label templates. The firmware
//! draws it natively from a `BARCODE` directive; this module produces the
//! same module pattern for local rasterization.

use crate::error::{PrintError, PrintResult};

/// Linear symbologies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbology {
    Code128,
}

impl Symbology {
    /// Firmware code type name
    pub fn code(self) -> &'static str {
        match self {
            Symbology::Code128 => "128",
        }
    }

    /// Bar/space module widths for `data`, starting with a bar
    pub fn modules(self, data: &str) -> PrintResult<Vec<u8>> {
        match self {
            Symbology::Code128 => code128_modules(data),
        }
    }
}

/// Element widths (bar, space, bar, ...) for every Code 128 symbol value
const CODE128_PATTERNS: [&str; 107] = [
    "212222", "222122", "222221", "121223", "121322", "131222", "122213", "122312", "132212",
    "221213", "221312", "231212", "112232", "122132", "122231", "113222", "123122", "123221",
    "223211", "221132", "221231", "213212", "223112", "312131", "311222", "321122", "321221",
    "312212", "322112", "322211", "212123", "212321", "232121", "111323", "131123", "131321",
    "112313", "132113", "132311", "211313", "231113", "231311", "112133", "112331", "132131",
    "113123", "113321", "133121", "313121", "211331", "231131", "213113", "213311", "213131",
    "311123", "311321", "331121", "312113", "312311", "332111", "314111", "221411", "431111",
    "111224", "111422", "121124", "121421", "141122", "141221", "112214", "112412", "122114",
    "122411", "142112", "142211", "241211", "221114", "413111", "241112", "134111", "111242",
    "121142", "121241", "114212", "124112", "124211", "411212", "421112", "421211", "212141",
    "214121", "412121", "111143", "111341", "131141", "114113", "114311", "411113", "411311",
    "113141", "114131", "311141", "411131", "211412", "211214", "211232", "2331112",
];

const START_B: usize = 104;
const STOP: usize = 106;

/// Symbol values for `data` in subset B, including start, checksum and stop
pub fn code128_values(data: &str) -> PrintResult<Vec<usize>> {
    if data.is_empty() {
        return Err(PrintError::InvalidBarcode("empty barcode data".into()));
    }

    let mut values = Vec::with_capacity(data.len() + 3);
    values.push(START_B);
    for c in data.chars() {
        let code = c as u32;
        if !(0x20..=0x7E).contains(&code) {
            return Err(PrintError::InvalidBarcode(format!(
                "character {:?} not encodable in Code 128",
                c
            )));
        }
        values.push((code - 0x20) as usize);
    }

    let checksum = values
        .iter()
        .enumerate()
        .skip(1)
        .fold(START_B, |acc, (i, v)| acc + i * v)
        % 103;
    values.push(checksum);
    values.push(STOP);
    Ok(values)
}

fn code128_modules(data: &str) -> PrintResult<Vec<u8>> {
    let values = code128_values(data)?;
    Ok(values
        .into_iter()
        .flat_map(|v| CODE128_PATTERNS[v].bytes().map(|b| b - b'0'))
        .collect())
}

/// Total symbol width in modules
pub fn module_count(modules: &[u8]) -> u32 {
    modules.iter().map(|&m| m as u32).sum()
}
