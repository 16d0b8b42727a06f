//! Example: Render a small city to SVG
//!
//! Builds a land mass, a city boundary with a lake and a handful of coloured
//! sites in memory, then writes `output/harbour.svg`.
//!
//! `cargo run --example render_city`

use city_voronoi::*;
use geo::{polygon, MultiPolygon};

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    // A coastline at x = 3 km; everything east of it is sea
    let land = LandIndex::new(vec![polygon![
        (x: -20_000.0, y: -20_000.0),
        (x: 3_000.0, y: -20_000.0),
        (x: 3_000.0, y: 20_000.0),
        (x: -20_000.0, y: 20_000.0),
    ]])?;

    let boundary = Boundary::from_polygon(
        polygon![
            (x: -5_000.0, y: -3_000.0),
            (x: 5_000.0, y: -3_000.0),
            (x: 5_000.0, y: 3_000.0),
            (x: -5_000.0, y: 3_000.0),
        ],
        Crs::WebMercator,
    );

    let lake = MultiPolygon::new(vec![polygon![
        (x: -1_000.0, y: -800.0),
        (x: 500.0, y: -800.0),
        (x: 500.0, y: 600.0),
        (x: -1_000.0, y: 600.0),
    ]]);

    // (id, lat, lon, rgb)
    let pois = [
        ("old-town", 0.015, -0.030, [0.82, 0.33, 0.25]),
        ("market", -0.010, -0.015, [0.93, 0.76, 0.30]),
        ("park", 0.020, 0.005, [0.30, 0.62, 0.35]),
        ("docks", -0.020, 0.020, [0.22, 0.40, 0.63]),
        ("station", 0.000, -0.040, [0.55, 0.55, 0.58]),
        ("museum", 0.010, 0.020, [0.61, 0.36, 0.62]),
        ("lighthouse", 0.000, 0.040, [1.00, 1.00, 1.00]),
    ];

    let mut sites = Vec::with_capacity(pois.len());
    for (id, lat, lon, rgb) in pois {
        sites.push(Site::new(SiteId::from(id), GeoCoord::new(lat, lon)?, Color::from_slice(&rgb)?));
    }

    let input = CityInput {
        key: "harbour".to_string(),
        boundary,
        water: lake,
        water_crs: Crs::WebMercator,
        sites,
        rejected: Vec::new(),
    };

    let config = ArtworkConfigBuilder::new().canvas_size(800.0)?.build()?;
    let (artwork, path) = run_city(&land, &input, &config)?;

    println!("Region area: {:.0} m²", artwork.region.area());
    println!("Cells: {}", artwork.tessellation.len());
    for diagnostic in &artwork.diagnostics {
        println!("  dropped {}", diagnostic);
    }
    println!("Wrote {}", path.display());

    Ok(())
}
