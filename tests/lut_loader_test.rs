mod common;

use crate::common::test_utils::assert_close;
use showroom::{
    post::LutTable,
    resources::lut::{Lut3d, parse_3dl, parse_cube, parse_lut},
};

const TWELVE_BIT_3DL: &str = "\
# blue varies fastest
0 1023
0 0 0
0 0 1000
0 2000 0
0 2000 1000
4000 0 0
4000 0 1000
4000 2000 0
4000 2000 1000
";

const SMALL_CUBE: &str = "\
TITLE \"tiny\"
# red varies fastest
LUT_3D_SIZE 2
DOMAIN_MIN 0.0 0.0 0.0
DOMAIN_MAX 1.0 1.0 1.0
0.0 0.0 0.0
0.9 0.0 0.0
0.0 0.8 0.0
0.9 0.8 0.0
0.0 0.0 0.7
0.9 0.0 0.7
0.0 0.8 0.7
0.9 0.8 0.7
";

#[test]
fn should_reorder_3dl_to_red_fastest() {
    let lut = parse_3dl(TWELVE_BIT_3DL).expect("valid table");

    assert_eq!(lut.size, 2);
    assert_eq!(lut.data.len(), 8);
    assert_eq!(lut.texel(0, 0, 0), [0.0, 0.0, 0.0, 1.0]);
    assert_eq!(lut.texel(1, 0, 0), [4000.0 / 4096.0, 0.0, 0.0, 1.0]);
    assert_eq!(lut.texel(0, 1, 0), [0.0, 2000.0 / 4096.0, 0.0, 1.0]);
    assert_eq!(lut.texel(0, 0, 1), [0.0, 0.0, 1000.0 / 4096.0, 1.0]);
    // red-fastest storage
    assert_eq!(lut.data[1], lut.texel(1, 0, 0));
    assert_eq!(lut.data[4], lut.texel(0, 0, 1));
}

#[test]
fn should_scale_3dl_by_bit_depth() {
    let ten_bit = "0 1023\n0 0 0\n0 0 1023\n0 1023 0\n0 1023 1023\n1023 0 0\n1023 0 1023\n1023 1023 0\n1023 1023 1023\n";
    let lut = parse_3dl(ten_bit).expect("valid table");

    let [r, g, b, _] = lut.texel(1, 1, 1);
    assert_close(r, 1023.0 / 1024.0, 1e-6);
    assert_close(g, 1023.0 / 1024.0, 1e-6);
    assert_close(b, 1023.0 / 1024.0, 1e-6);
}

#[test]
fn should_reject_inconsistent_3dl_grid() {
    let text = "0 512 1023\n".to_string() + &"0 0 0\n".repeat(27);
    let err = parse_3dl(&text).unwrap_err();
    assert!(format!("{err:#}").contains("inconsistent grid size"));
}

#[test]
fn should_reject_malformed_3dl_rows() {
    let short = "0 1023\n0 0 0\n";
    assert!(parse_3dl(short).is_err());

    let two_values = "0 1023\n".to_string() + &"0 0\n".repeat(8);
    assert!(parse_3dl(&two_values).is_err());

    let too_many = "0 1023\n".to_string() + &"0 0 0\n".repeat(9);
    assert!(parse_3dl(&too_many).is_err());

    assert!(parse_3dl("").is_err());
}

#[test]
fn should_parse_cube() {
    let lut = parse_cube(SMALL_CUBE).expect("valid table");

    assert_eq!(lut.size, 2);
    assert_eq!(lut.texel(1, 0, 0), [0.9, 0.0, 0.0, 1.0]);
    assert_eq!(lut.texel(0, 1, 0), [0.0, 0.8, 0.0, 1.0]);
    assert_eq!(lut.texel(1, 1, 1), [0.9, 0.8, 0.7, 1.0]);
    assert_eq!(lut.domain_min, [0.0; 3]);
    assert_eq!(lut.domain_max, [1.0; 3]);
}

#[test]
fn should_reject_incomplete_cube() {
    assert!(parse_cube("0.0 0.0 0.0\n").is_err());
    assert!(parse_cube("LUT_3D_SIZE 2\n0.0 0.0 0.0\n").is_err());
    assert!(parse_cube("LUT_1D_SIZE 16\n").is_err());
}

#[test]
fn should_skip_3dl_header_lines() {
    let body = TWELVE_BIT_3DL.trim_start_matches("# blue varies fastest\n");
    let text = format!("3DMESH\nMesh 1 10\n{body}LUT8\ngamma 1.0\n");
    let lut = parse_3dl(&text).expect("header is skipped");

    assert_eq!(lut, parse_3dl(TWELVE_BIT_3DL).expect("valid table"));
}

#[test]
fn should_reject_out_of_range_table_sizes() {
    assert!(parse_cube("LUT_3D_SIZE 0\n").is_err());
    assert!(parse_cube("LUT_3D_SIZE 1\n0.0 0.0 0.0\n").is_err());
    assert!(parse_cube("LUT_3D_SIZE 2000\n").is_err());
    assert!(parse_cube("LUT_3D_SIZE 4294967295\n").is_err());

    let grid: Vec<String> = (0..300).map(|i| (i * 4).to_string()).collect();
    let err = parse_3dl(&grid.join(" ")).unwrap_err();
    assert!(format!("{err:#}").contains("table size 300"));
}

#[test]
fn should_carry_cube_domain_to_table() {
    let text = SMALL_CUBE
        .replace("DOMAIN_MIN 0.0 0.0 0.0", "DOMAIN_MIN -0.5 0.0 0.25")
        .replace("DOMAIN_MAX 1.0 1.0 1.0", "DOMAIN_MAX 2.0 4.0 1.5");
    let lut = parse_cube(&text).expect("valid table");

    assert_eq!(
        lut.table(),
        LutTable {
            size: 2,
            domain_min: [-0.5, 0.0, 0.25],
            domain_max: [2.0, 4.0, 1.5],
        }
    );

    let flipped = SMALL_CUBE.replace("DOMAIN_MAX 1.0 1.0 1.0", "DOMAIN_MAX 1.0 0.0 1.0");
    assert!(parse_cube(&flipped).is_err());
}

#[test]
fn should_pick_parser_by_extension() {
    assert!(parse_lut("grade.CUBE", SMALL_CUBE).is_ok());
    assert!(parse_lut("luts/grade.3dl", TWELVE_BIT_3DL).is_ok());
    assert!(parse_lut("grade.png", SMALL_CUBE).is_err());
}

#[test]
fn should_build_identity_table() {
    let lut = Lut3d::identity(33);

    assert_eq!(lut.data.len(), 33 * 33 * 33);
    assert_eq!(lut.texel(32, 0, 16), [1.0, 0.0, 0.5, 1.0]);
    assert_eq!(Lut3d::identity(0).size, 2);

    let bytes = Lut3d::identity(2).to_rgba8();
    assert_eq!(&bytes[0..8], &[0, 0, 0, 255, 255, 0, 0, 255]);
}
