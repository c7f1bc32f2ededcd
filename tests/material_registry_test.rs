mod common;

use crate::common::test_utils::new_showroom;
use showroom::{
    Color, Part, Shortcut, Showroom,
    data_structures::material::{MaterialRegistry, MaterialSet, SWATCHES, next_swatch},
};

fn mark_all_clean(showroom: &mut Showroom) {
    for (_, material) in showroom.materials_mut().iter_mut() {
        material.mark_clean();
    }
}

#[test]
fn should_start_from_default_colors() {
    let showroom = new_showroom(1200, 800, 1.0);
    let registry = showroom.materials().registry();

    assert_eq!(registry.get(Part::Body), Color::rgb(0x26, 0x26, 0x26));
    assert_eq!(registry.get(Part::Wheels), Color::rgb(0xff, 0xff, 0xff));
    assert_eq!(registry.get(Part::Brakes), Color::rgb(0xa1, 0xff, 0x00));
    assert_eq!(registry.get(Part::Glass), Color::rgb(0xff, 0xff, 0xff));
    for (part, material) in showroom.materials().iter() {
        assert_eq!(material.color, registry.get(part));
        assert!(material.dirty, "{part} should need its first upload");
    }
}

#[test]
fn should_recolor_only_the_changed_part() {
    let mut showroom = new_showroom(1200, 800, 1.0);
    mark_all_clean(&mut showroom);

    showroom
        .on_color_changed_str("Body", "#ff0000")
        .expect("valid color");

    let red = Color::rgb(0xff, 0x00, 0x00);
    assert_eq!(showroom.materials().registry().get(Part::Body), red);
    assert_eq!(showroom.materials().get(Part::Body).color, red);
    assert!(showroom.materials().get(Part::Body).dirty);
    assert_eq!(
        showroom.materials().get(Part::Wheels).color,
        Color::rgb(0xff, 0xff, 0xff)
    );
    assert!(!showroom.materials().get(Part::Wheels).dirty);
}

#[test]
fn should_isolate_every_part() {
    let color = Color::rgb(0x12, 0x34, 0x56);
    for part in Part::ALL {
        let mut materials = MaterialSet::default();
        let before = materials.registry().clone();
        for (_, material) in materials.iter_mut() {
            material.mark_clean();
        }

        materials.set_color(part, color);

        for other in Part::ALL {
            if other == part {
                assert_eq!(materials.registry().get(other), color);
                assert!(materials.get(other).dirty);
            } else {
                assert_eq!(materials.registry().get(other), before.get(other));
                assert_eq!(materials.get(other).color, before.get(other));
                assert!(!materials.get(other).dirty, "{other} changed with {part}");
            }
        }
    }
}

#[test]
fn should_reject_malformed_colors() {
    let mut showroom = new_showroom(1200, 800, 1.0);
    let before = showroom.materials().registry().clone();

    for bad in ["#zzzzzz", "#12345", "", "#ff00001", "#+1ff00", "#ü12"] {
        assert!(Color::from_hex(bad).is_err(), "{bad:?} should not parse");
        assert!(showroom.on_color_changed_str("Body", bad).is_err());
    }
    assert!(showroom.on_color_changed_str("Hood", "#ff0000").is_err());
    assert_eq!(showroom.materials().registry(), &before);
}

#[test]
fn should_parse_hex_forms() {
    assert_eq!(
        Color::from_hex("#abc").unwrap(),
        Color::rgb(0xaa, 0xbb, 0xcc)
    );
    assert_eq!(
        Color::from_hex("A1FF00").unwrap(),
        Color::rgb(0xa1, 0xff, 0x00)
    );
    assert_eq!(Color::rgb(0xa1, 0xff, 0x00).to_string(), "#a1ff00");
    assert_eq!("Glass".parse::<Part>().unwrap(), Part::Glass);
}

#[test]
fn should_convert_to_linear() {
    assert_eq!(Color::rgb(0, 0, 0).to_linear(), [0.0, 0.0, 0.0]);
    assert_eq!(Color::rgb(255, 255, 255).to_linear(), [1.0, 1.0, 1.0]);
    let [mid, _, _] = Color::rgb(0x80, 0, 0).to_linear();
    assert!((mid - 0.2158).abs() < 1e-3);
}

#[test]
fn should_build_registry_from_pairs() {
    let red = Color::rgb(0xff, 0, 0);
    let registry = MaterialRegistry::new(Part::ALL.map(|part| (part, red)));
    assert!(registry.iter().all(|(_, color)| color == red));
}

#[test]
fn should_cycle_color_of_open_panel() {
    let mut showroom = new_showroom(1200, 800, 1.0);
    assert_eq!(showroom.cycle_panel_color(), None);

    // Body
    showroom.on_shortcut(Shortcut::Label(1));
    let (part, color) = showroom.cycle_panel_color().expect("Body panel is open");
    assert_eq!(part, Part::Body);
    assert_eq!(color, next_swatch(SWATCHES[0]));
    assert_eq!(showroom.materials().registry().get(Part::Body), SWATCHES[1]);

    // Interior has no panel
    showroom.on_shortcut(Shortcut::Label(5));
    assert_eq!(showroom.cycle_panel_color(), None);
}

#[test]
fn should_restart_swatches_for_custom_colors() {
    assert_eq!(next_swatch(Color::rgb(1, 2, 3)), SWATCHES[0]);
    assert_eq!(next_swatch(SWATCHES[SWATCHES.len() - 1]), SWATCHES[0]);
}
