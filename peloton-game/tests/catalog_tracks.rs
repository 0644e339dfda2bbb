use peloton_game::{
    ConfigError, CourseCatalog, GameEngine, PlayerBracket, RulesConfig, SpaceKind, Track,
    TrackProvider,
};

const COURSES_JSON: &str = include_str!("../data/courses.json");

fn catalog() -> CourseCatalog {
    CourseCatalog::from_json(COURSES_JSON).expect("bundled course data parses")
}

#[test]
fn bundled_courses_assemble_for_every_listed_bracket() {
    let catalog = catalog();
    let rules = RulesConfig::default();
    let names = catalog.course_names();
    assert!(!names.is_empty());
    for name in &names {
        let brackets = catalog.brackets_for(name);
        assert!(!brackets.is_empty(), "{name} lists no bracket");
        for bracket in brackets {
            let track = Track::assemble(&catalog, name, bracket, &rules)
                .unwrap_or_else(|err| panic!("{name} {bracket}: {err}"));
            let first = track.space(0).unwrap();
            let last = track.space(track.last_index()).unwrap();
            assert!(first.is_start(), "{name} must open on a start space");
            assert!(last.is_finish(), "{name} must close on a finish space");
            assert!(!track.start_positions().is_empty());
            assert!(
                track
                    .spaces()
                    .iter()
                    .all(|space| (1..=3).contains(&space.lane_count()))
            );
        }
    }
}

#[test]
fn classic_layout_matches_tile_order() {
    let track = Track::assemble(
        &catalog(),
        "La Classicissima",
        PlayerBracket::TwoToFour,
        &RulesConfig::default(),
    )
    .unwrap();
    assert_eq!(track.tile_ids(), &["a", "b", "c", "d", "e", "f", "g"]);
    assert_eq!(track.len(), 34);
    assert_eq!(track.start_positions(), vec![0, 1, 2, 3, 4, 9]);

    let climb = track.space(14).unwrap();
    assert_eq!(climb.kind(), SpaceKind::Uphill);
    assert_eq!(climb.max_advance(), 5);
    assert!(!climb.allows_slipstream());
    assert_eq!(track.space(16).unwrap().lane_count(), 1);

    let descent = track.space(17).unwrap();
    assert_eq!(descent.min_advance(), 5);
    assert_eq!(track.space(24).unwrap().min_advance(), 4);
}

#[test]
fn wide_start_only_for_large_fields() {
    let catalog = catalog();
    let rules = RulesConfig::default();
    let small = Track::assemble(&catalog, "La Classicissima", PlayerBracket::TwoToFour, &rules)
        .unwrap();
    let large = Track::assemble(&catalog, "La Classicissima", PlayerBracket::FiveToSix, &rules)
        .unwrap();
    assert_eq!(small.space(0).unwrap().lane_count(), 2);
    assert_eq!(large.space(0).unwrap().lane_count(), 3);
    assert_eq!(small.len(), large.len());
}

#[test]
fn sprint_course_has_no_large_field_layout() {
    let engine = GameEngine::new(catalog());
    let err = engine
        .create_race("Plateau de Sprint", PlayerBracket::FiveToSix, 1)
        .unwrap_err();
    assert!(matches!(
        err,
        ConfigError::CourseNotFound {
            bracket: PlayerBracket::FiveToSix,
            ..
        }
    ));
    assert!(err.to_string().contains("5-6"));
}

#[test]
fn custom_rules_reach_every_space() {
    let rules = RulesConfig::from_json(r#"{"max_advance": 8, "min_advance": 3}"#).unwrap();
    let engine = GameEngine::with_rules(catalog(), rules).unwrap();
    let track = engine
        .load_track("Plateau de Sprint", PlayerBracket::TwoToFour)
        .unwrap();
    let normal = track
        .spaces()
        .iter()
        .find(|space| space.kind() == SpaceKind::Normal)
        .unwrap();
    assert_eq!((normal.min_advance(), normal.max_advance()), (3, 8));
}
