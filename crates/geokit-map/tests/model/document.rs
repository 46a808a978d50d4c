use geokit_map::{
    AreaSymbol, CombinedSymbol, LineSymbol, Map, MapColor, MapCoordF, MapObject, PathObject, Rgb,
    Symbol, SymbolKind, SymbolType,
};

fn square(size: f64) -> PathObject {
    let mut path = PathObject::new();
    path.add_coordinate(MapCoordF::new(0.0, 0.0), false);
    path.add_coordinate(MapCoordF::new(size, 0.0), false);
    path.add_coordinate(MapCoordF::new(size, size), false);
    path.close_all_parts();
    path
}

#[test]
fn test_objects_go_to_current_part() {
    let mut map = Map::new();
    let symbol = map.add_symbol(Symbol::new("area", SymbolKind::Area(AreaSymbol::default())));
    map.add_object(MapObject::path(symbol, square(1.0)));
    let second = map.add_part("second");
    map.set_current_part(second);
    map.add_object(MapObject::path(symbol, square(2.0)));
    map.add_object(MapObject::path(symbol, square(3.0)));

    assert_eq!(map.parts()[0].object_count(), 1);
    assert_eq!(map.parts()[1].object_count(), 2);
    assert_eq!(map.object_count(), 3);
}

#[test]
fn test_combined_symbol_colors_follow_parts() {
    let mut map = Map::new();
    let red = map.add_color(MapColor::from_rgb("red", Rgb::new(255, 0, 0)));
    let blue = map.add_color(MapColor::from_rgb("blue", Rgb::new(0, 0, 255)));
    let line = map.add_symbol(Symbol::new(
        "line",
        SymbolKind::Line(LineSymbol {
            color: Some(blue),
            line_width_mm: 0.3,
            ..LineSymbol::default()
        }),
    ));
    let area = map.add_symbol(Symbol::new(
        "area",
        SymbolKind::Area(AreaSymbol {
            color: Some(red),
            fill_patterns: Vec::new(),
        }),
    ));
    let combined = map.add_symbol(Symbol::new(
        "combined",
        SymbolKind::Combined(CombinedSymbol {
            parts: vec![Some(area), Some(line)],
        }),
    ));

    assert_eq!(map.symbol_colors(combined), vec![red, blue]);
    assert_eq!(map.lowest_color_priority(combined), Some(0));
    assert_eq!(map.guess_dominant_color(combined), Some(red));
    assert!(map.has_symbol_type(SymbolType::Combined));
}

#[test]
fn test_try_visitor_stops_on_error() {
    let mut map = Map::new();
    let symbol = map.add_symbol(Symbol::new("area", SymbolKind::Area(AreaSymbol::default())));
    for i in 0..5 {
        map.add_object(MapObject::point(symbol, MapCoordF::new(f64::from(i), 0.0)));
    }
    let mut seen = 0;
    let result: Result<(), String> = map.try_apply_on_matching_objects(
        |_| true,
        |object| {
            seen += 1;
            if object.primary_coord().map(|c| c.x) == Some(2.0) {
                Err("stop".to_string())
            } else {
                Ok(())
            }
        },
    );
    assert!(result.is_err());
    assert_eq!(seen, 3);
}
