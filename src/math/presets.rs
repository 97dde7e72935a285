use crate::math::surface::ShapeConstants;

pub struct ShapePreset {
    pub name: &'static str,
    pub description: &'static str,
    pub constants: ShapeConstants,
    pub resolution: u32,
}

pub const SHAPE_PRESETS: &[ShapePreset] = &[
    ShapePreset {
        name: "Spiral Tube",
        description: "Default coil, r = 1, a = 0.5",
        constants: ShapeConstants::new(1.0, 0.5),
        resolution: 300,
    },
    ShapePreset {
        name: "Thin Coil",
        description: "Narrow profile around a wider core",
        constants: ShapeConstants::new(1.2, 0.2),
        resolution: 300,
    },
    ShapePreset {
        name: "Wide Ribbon",
        description: "Profile radius close to the core radius",
        constants: ShapeConstants::new(0.8, 0.9),
        resolution: 240,
    },
    ShapePreset {
        name: "Preview",
        description: "Coarse grid for slow machines",
        constants: ShapeConstants::new(1.0, 0.5),
        resolution: 60,
    },
];

pub fn find_preset(name: &str) -> Option<&'static ShapePreset> {
    SHAPE_PRESETS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_buildable() {
        for preset in SHAPE_PRESETS {
            assert!(preset.resolution >= 1, "{}", preset.name);
            assert!(preset.constants.r > 0.0 && preset.constants.a > 0.0);
        }
    }

    #[test]
    fn lookup_ignores_case() {
        let preset = find_preset("thin coil").unwrap();
        assert_eq!(preset.constants, ShapeConstants::new(1.2, 0.2));
        assert!(find_preset("nope").is_none());
    }
}
