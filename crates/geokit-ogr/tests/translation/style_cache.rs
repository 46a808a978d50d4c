use geokit_map::{Map, SymbolType};
use geokit_ogr::{ColorCache, DefaultSymbols, StyleTool, SymbolResolver};
use proptest::prelude::*;

fn resolver() -> (Map, SymbolResolver) {
    let mut map = Map::new();
    let defaults = DefaultSymbols::create(&mut map);
    (map, SymbolResolver::new(defaults))
}

fn pen(rgb: (u8, u8, u8), width: u32) -> String {
    format!(
        "PEN(c:#{:02x}{:02x}{:02x},w:{}mm)",
        rgb.0,
        rgb.1,
        rgb.2,
        f64::from(width) / 100.0
    )
}

proptest! {
    #[test]
    fn prop_equal_styles_share_one_symbol(rgb in any::<(u8, u8, u8)>(), width in 1u32..500) {
        let (mut map, mut resolver) = resolver();
        let style = pen(rgb, width);
        let first = resolver.resolve(&mut map, SymbolType::Line, &style);
        let count = map.symbol_count();
        let second = resolver.resolve(&mut map, SymbolType::Line, &style);
        prop_assert_eq!(first.id, second.id);
        prop_assert_eq!(map.symbol_count(), count);
    }

    #[test]
    fn prop_distinct_styles_get_distinct_symbols(a in 1u32..500, b in 1u32..500) {
        prop_assume!(a != b);
        let (mut map, mut resolver) = resolver();
        let first = resolver.resolve(&mut map, SymbolType::Line, &pen((10, 20, 30), a));
        let second = resolver.resolve(&mut map, SymbolType::Line, &pen((10, 20, 30), b));
        prop_assert_ne!(first.id, second.id);
    }

    #[test]
    fn prop_colors_created_once(rgb in any::<(u8, u8, u8)>()) {
        let (mut map, _) = resolver();
        let fallback = geokit_map::ColorId(0);
        let mut cache = ColorCache::new();
        let color = format!("#{:02x}{:02x}{:02x}", rgb.0, rgb.1, rgb.2);
        let first = cache.get_or_create(&mut map, &color, fallback);
        let count = map.color_count();
        let second = cache.get_or_create(&mut map, &color, fallback);
        prop_assert_eq!(first, second);
        prop_assert_eq!(map.color_count(), count);
    }

    #[test]
    fn prop_canonical_tool_text_is_stable(rgb in any::<(u8, u8, u8)>(), width in 1u32..500) {
        let tools = StyleTool::parse_all(&pen(rgb, width)).unwrap();
        let canonical = tools[0].to_style_string();
        let reparsed = StyleTool::parse_all(&canonical).unwrap();
        prop_assert_eq!(reparsed[0].to_style_string(), canonical);
    }
}

#[test]
fn test_styles_without_pen_share_the_default() {
    let (mut map, mut resolver) = resolver();
    let default_line = resolver.defaults().line;
    let a = resolver.resolve(&mut map, SymbolType::Line, "");
    let b = resolver.resolve(&mut map, SymbolType::Line, "BRUSH(fc:#00ff00)");
    assert_eq!(a.id, default_line);
    assert_eq!(b.id, default_line);
}
