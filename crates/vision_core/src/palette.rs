//! Fixed class-id to RGB color table for rendering segmentation masks.

/// Color table inherited from the upstream labeling: the 21 PASCAL VOC
/// classes plus 30 extended ids. Entries are stored as `u16` triples because
/// id 25 carries a channel value of 256, one past the valid u8 range; that
/// is a defect in the source table, kept verbatim rather than corrected.
/// Converting through [`ClassPalette::color`] wraps it to 0, matching how
/// the original consumed the table.
pub const CLASS_COLORS: [[u16; 3]; 51] = [
    [0, 0, 0],       // 0: background
    [128, 0, 0],     // 1: aeroplane
    [0, 128, 0],     // 2: bicycle
    [128, 128, 0],   // 3: bird
    [0, 0, 128],     // 4: boat
    [128, 0, 128],   // 5: bottle
    [0, 128, 128],   // 6: bus
    [128, 128, 128], // 7: car
    [64, 0, 0],      // 8: cat
    [192, 0, 0],     // 9: chair
    [64, 128, 0],    // 10: cow
    [192, 128, 0],   // 11: diningtable
    [64, 0, 128],    // 12: dog
    [192, 0, 128],   // 13: horse
    [64, 128, 128],  // 14: motorbike
    [192, 128, 128], // 15: person
    [0, 64, 0],      // 16: pottedplant
    [128, 64, 0],    // 17: sheep
    [0, 192, 0],     // 18: sofa
    [128, 192, 0],   // 19: train
    [0, 64, 128],    // 20: tvmonitor
    [224, 224, 192],
    [42, 10, 98],
    [104, 185, 109],
    [126, 216, 148],
    [256, 17, 148], // 25: out-of-range red channel in the source table
    [122, 213, 141],
    [39, 92, 78],
    [160, 28, 161],
    [70, 167, 232],
    [0, 154, 154],
    [244, 45, 211],
    [194, 181, 180],
    [128, 218, 14],
    [204, 136, 227],
    [141, 55, 97],
    [233, 226, 230],
    [56, 113, 66],
    [254, 176, 11],
    [83, 54, 101],
    [46, 169, 64],
    [174, 240, 77],
    [134, 52, 242],
    [128, 184, 108],
    [239, 198, 150],
    [91, 135, 89],
    [207, 115, 187],
    [252, 253, 222],
    [224, 27, 231],
    [180, 47, 8],
    [54, 166, 13],
];

/// Lookup table from class id to RGB color.
#[derive(Debug, Clone)]
pub struct ClassPalette {
    colors: Vec<[u16; 3]>,
}

impl ClassPalette {
    /// The full 51-entry table used by the segmentation dataset.
    pub fn voc_extended() -> Self {
        Self {
            colors: CLASS_COLORS.to_vec(),
        }
    }

    /// A custom table, e.g. for datasets with fewer classes.
    pub fn from_colors(colors: Vec<[u16; 3]>) -> Self {
        Self { colors }
    }

    pub fn num_classes(&self) -> usize {
        self.colors.len()
    }

    /// RGB color for a class id, or `None` when the id is outside the table.
    /// Channel values convert with wrapping, so entry 25's 256 becomes 0.
    pub fn color(&self, class_id: i64) -> Option<[u8; 3]> {
        if class_id < 0 {
            return None;
        }
        let c = self.colors.get(class_id as usize)?;
        Some([c[0] as u8, c[1] as u8, c[2] as u8])
    }
}
