use super::*;

#[test]
fn sha256_hex_known_vector() {
    assert_eq!(
        sha256_hex(b"abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn empty_book_reports_missing_face() {
    let book = FontBook::load(&[], false);
    assert_eq!(book.face_count(), 0);
    let err = book.resolve("Monospace", FontWeight::Normal).unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
}

#[test]
fn missing_font_dir_is_skipped() {
    let dir = std::env::temp_dir().join("diffusion-reel-no-such-font-dir");
    let book = FontBook::load(&[dir], false);
    assert_eq!(book.face_count(), 0);
}

fn synthetic_face(family: &str, weight: u16, monospaced: bool) -> usvg::fontdb::FaceInfo {
    let data: Vec<u8> = format!("{family}-{weight}").into_bytes();
    usvg::fontdb::FaceInfo {
        id: usvg::fontdb::ID::dummy(),
        source: usvg::fontdb::Source::Binary(Arc::new(data)),
        index: 0,
        families: vec![(
            family.to_owned(),
            usvg::fontdb::Language::English_UnitedStates,
        )],
        post_script_name: family.replace(' ', ""),
        style: usvg::fontdb::Style::Normal,
        weight: usvg::fontdb::Weight(weight),
        stretch: usvg::fontdb::Stretch::Normal,
        monospaced,
    }
}

fn synthetic_book(faces: &[(&str, u16, bool)]) -> FontBook {
    let mut db = usvg::fontdb::Database::new();
    for &(family, weight, monospaced) in faces {
        db.push_face_info(synthetic_face(family, weight, monospaced));
    }
    FontBook::from_database(db)
}

#[test]
fn generic_monospace_prefers_known_family_with_matching_bold() {
    let book = synthetic_book(&[
        ("DejaVu Math TeX Gyre", 400, false),
        ("DejaVu Sans", 400, false),
        ("DejaVu Sans Mono", 400, true),
        ("DejaVu Sans Mono", 700, true),
    ]);

    let regular = book.resolve("Monospace", FontWeight::Normal).unwrap();
    let bold = book.resolve("Monospace", FontWeight::Bold).unwrap();
    assert_eq!(regular.family, "DejaVu Sans Mono");
    assert_eq!(bold.family, "DejaVu Sans Mono");
    assert_eq!(regular.bytes.as_slice(), b"DejaVu Sans Mono-400");
    assert_eq!(bold.bytes.as_slice(), b"DejaVu Sans Mono-700");

    let sans = book.resolve("sans", FontWeight::Normal).unwrap();
    assert_eq!(sans.family, "DejaVu Sans");
}

#[test]
fn generic_monospace_falls_back_to_any_monospaced_family() {
    let book = synthetic_book(&[
        ("Aardvark Display", 400, false),
        ("Zeta Code", 400, true),
        ("Zeta Code", 700, true),
    ]);

    let regular = book.resolve("monospace", FontWeight::Normal).unwrap();
    let bold = book.resolve("monospace", FontWeight::Bold).unwrap();
    assert_eq!(regular.family, "Zeta Code");
    assert_eq!(bold.family, "Zeta Code");
    assert_ne!(regular.bytes, bold.bytes);
}

#[test]
fn unknown_family_resolves_to_monospace_at_requested_weight() {
    let book = synthetic_book(&[
        ("Liberation Mono", 400, true),
        ("Liberation Mono", 700, true),
    ]);
    let bold = book.resolve("No Such Family", FontWeight::Bold).unwrap();
    assert_eq!(bold.family, "Liberation Mono");
    assert_eq!(bold.bytes.as_slice(), b"Liberation Mono-700");
}

#[test]
fn system_monospace_resolves_monospaced_faces_with_distinct_bold() {
    let book = FontBook::load(&[], true);
    let has_mono = |family: &str, bold: bool| {
        book.db.faces().any(|f| {
            f.monospaced
                && (!bold || f.weight.0 >= 600)
                && f.families.iter().any(|(n, _)| n == family)
        })
    };
    if !book.db.faces().any(|f| f.monospaced) {
        eprintln!("skipping: no monospaced system font installed");
        return;
    }

    let regular = book.resolve("Monospace", FontWeight::Normal).unwrap();
    let bold = book.resolve("Monospace", FontWeight::Bold).unwrap();
    assert!(
        has_mono(&regular.family, false),
        "{} is not monospaced",
        regular.family
    );
    assert_eq!(regular.family, bold.family);
    if has_mono(&regular.family, true) {
        assert!(
            regular.bytes != bold.bytes || regular.index != bold.index,
            "bold resolved to the regular face of {}",
            regular.family
        );
    }
}
