//! Spatial references and coordinate transformations
//!
//! References are shared as [`SrsRef`]. Transformations between two
//! references go through WGS84 geographic coordinates. Transverse Mercator
//! uses the Krüger series on the WGS84 ellipsoid, orthographic uses the
//! ellipsoidal EPSG 9840 formulas. With the `proj` feature enabled,
//! transformations between references with a PROJ definition are handed to
//! the PROJ library, falling back to the built-in formulas when PROJ
//! cannot build a pipeline.

use geokit_core::GeoreferencingError;
use geokit_core::units::format_number;
use std::fmt::Write as _;
use std::sync::{Arc, OnceLock};

/// Shared handle to a spatial reference
pub type SrsRef = Arc<SpatialReference>;

/// WGS84 semi-major axis (m)
pub const WGS84_A: f64 = 6_378_137.0;

/// WGS84 flattening
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

/// Coefficients of the 6th order Krüger series for WGS84
struct KruegerSeries {
    /// Rectifying radius
    a: f64,
    e: f64,
    alpha: [f64; 6],
    beta: [f64; 6],
}

impl KruegerSeries {
    fn wgs84() -> &'static Self {
        static SERIES: OnceLock<KruegerSeries> = OnceLock::new();
        SERIES.get_or_init(|| {
            let n = WGS84_F / (2.0 - WGS84_F);
            let (n2, n3) = (n * n, n * n * n);
            let (n4, n5, n6) = (n3 * n, n3 * n2, n3 * n3);
            Self {
                a: WGS84_A / (1.0 + n) * (1.0 + n2 / 4.0 + n4 / 64.0 + n6 / 256.0),
                e: WGS84_E2.sqrt(),
                alpha: [
                    n / 2.0 - 2.0 / 3.0 * n2 + 5.0 / 16.0 * n3 + 41.0 / 180.0 * n4
                        - 127.0 / 288.0 * n5
                        + 7891.0 / 37800.0 * n6,
                    13.0 / 48.0 * n2 - 3.0 / 5.0 * n3 + 557.0 / 1440.0 * n4 + 281.0 / 630.0 * n5
                        - 1_983_433.0 / 1_935_360.0 * n6,
                    61.0 / 240.0 * n3 - 103.0 / 140.0 * n4
                        + 15061.0 / 26880.0 * n5
                        + 167_603.0 / 181_440.0 * n6,
                    49561.0 / 161_280.0 * n4 - 179.0 / 168.0 * n5
                        + 6_601_661.0 / 7_257_600.0 * n6,
                    34729.0 / 80640.0 * n5 - 3_418_889.0 / 1_995_840.0 * n6,
                    212_378_941.0 / 319_334_400.0 * n6,
                ],
                beta: [
                    n / 2.0 - 2.0 / 3.0 * n2 + 37.0 / 96.0 * n3 - 1.0 / 360.0 * n4
                        - 81.0 / 512.0 * n5
                        + 96199.0 / 604_800.0 * n6,
                    1.0 / 48.0 * n2 + 1.0 / 15.0 * n3 - 437.0 / 1440.0 * n4 + 46.0 / 105.0 * n5
                        - 1_118_711.0 / 3_870_720.0 * n6,
                    17.0 / 480.0 * n3 - 37.0 / 840.0 * n4 - 209.0 / 4480.0 * n5
                        + 5569.0 / 90720.0 * n6,
                    4397.0 / 161_280.0 * n4 - 11.0 / 504.0 * n5 - 830_251.0 / 7_257_600.0 * n6,
                    4583.0 / 161_280.0 * n5 - 108_847.0 / 3_991_680.0 * n6,
                    20_648_693.0 / 638_668_800.0 * n6,
                ],
            }
        })
    }

    /// Tangent of the conformal latitude for the tangent of `phi`.
    fn conformal(&self, tau: f64) -> f64 {
        let sigma = (self.e * (self.e * tau / (1.0 + tau * tau).sqrt()).atanh()).sinh();
        tau * (1.0 + sigma * sigma).sqrt() - sigma * (1.0 + tau * tau).sqrt()
    }

    /// Normalized (xi, eta) for a latitude and a longitude difference, in radians.
    fn forward(&self, phi: f64, d_lambda: f64) -> (f64, f64) {
        let tau_c = self.conformal(phi.tan());
        let xi_c = tau_c.atan2(d_lambda.cos());
        let eta_c = (d_lambda.sin() / tau_c.hypot(d_lambda.cos())).asinh();
        let (mut xi, mut eta) = (xi_c, eta_c);
        for (j, alpha) in self.alpha.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi += alpha * (k * xi_c).sin() * (k * eta_c).cosh();
            eta += alpha * (k * xi_c).cos() * (k * eta_c).sinh();
        }
        (xi, eta)
    }

    /// Latitude and longitude difference, in radians, for normalized (xi, eta).
    fn inverse(&self, xi: f64, eta: f64) -> (f64, f64) {
        let (mut xi_c, mut eta_c) = (xi, eta);
        for (j, beta) in self.beta.iter().enumerate() {
            let k = 2.0 * (j + 1) as f64;
            xi_c -= beta * (k * xi).sin() * (k * eta).cosh();
            eta_c -= beta * (k * xi).cos() * (k * eta).sinh();
        }
        let sinh_eta = eta_c.sinh();
        let cos_xi = xi_c.cos();
        let tau_c = xi_c.sin() / sinh_eta.hypot(cos_xi);

        let mut tau = tau_c;
        for _ in 0..16 {
            let tau_i = self.conformal(tau);
            let delta = (tau_c - tau_i) / (1.0 + tau_i * tau_i).sqrt()
                * (1.0 + (1.0 - WGS84_E2) * tau * tau)
                / ((1.0 - WGS84_E2) * (1.0 + tau * tau).sqrt());
            tau += delta;
            if delta.abs() < 1e-12 {
                break;
            }
        }
        (tau.atan(), sinh_eta.atan2(cos_xi))
    }
}

/// Radius of curvature in the prime vertical
fn prime_vertical_radius(phi: f64) -> f64 {
    WGS84_A / (1.0 - WGS84_E2 * phi.sin().powi(2)).sqrt()
}

/// A map projection
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// Orthographic azimuthal projection
    Orthographic { lat_0: f64, lon_0: f64 },
    /// Transverse Mercator
    TransverseMercator {
        lat_0: f64,
        lon_0: f64,
        k_0: f64,
        x_0: f64,
        y_0: f64,
    },
    /// Universal Transverse Mercator zone
    Utm { zone: u8, south: bool },
}

impl Projection {
    fn as_transverse_mercator(&self) -> Option<(f64, f64, f64, f64, f64)> {
        match *self {
            Self::TransverseMercator {
                lat_0,
                lon_0,
                k_0,
                x_0,
                y_0,
            } => Some((lat_0, lon_0, k_0, x_0, y_0)),
            Self::Utm { zone, south } => Some((
                0.0,
                f64::from(zone) * 6.0 - 183.0,
                0.9996,
                500_000.0,
                if south { 10_000_000.0 } else { 0.0 },
            )),
            Self::Orthographic { .. } => None,
        }
    }

    /// Geographic (degrees) to projected (m).
    fn forward(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        if let Self::Orthographic { lat_0, lon_0 } = *self {
            return orthographic_forward(lat_0, lon_0, lon, lat);
        }
        let (lat_0, lon_0, k_0, x_0, y_0) = self.as_transverse_mercator()?;
        let d_lambda = (lon - lon_0).to_radians();
        if d_lambda.cos() <= 0.0 {
            // More than 90 degrees off the central meridian
            return None;
        }
        let series = KruegerSeries::wgs84();
        let (xi, eta) = series.forward(lat.to_radians(), d_lambda);
        let (xi_0, _) = series.forward(lat_0.to_radians(), 0.0);
        Some((x_0 + k_0 * series.a * eta, y_0 + k_0 * series.a * (xi - xi_0)))
    }

    /// Projected (m) to geographic (degrees).
    fn inverse(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if let Self::Orthographic { lat_0, lon_0 } = *self {
            return orthographic_inverse(lat_0, lon_0, x, y);
        }
        let (lat_0, lon_0, k_0, x_0, y_0) = self.as_transverse_mercator()?;
        let series = KruegerSeries::wgs84();
        let (xi_0, _) = series.forward(lat_0.to_radians(), 0.0);
        let eta = (x - x_0) / (k_0 * series.a);
        let xi = (y - y_0) / (k_0 * series.a) + xi_0;
        let (phi, d_lambda) = series.inverse(xi, eta);
        Some((lon_0 + d_lambda.to_degrees(), phi.to_degrees()))
    }
}

fn orthographic_forward(lat_0: f64, lon_0: f64, lon: f64, lat: f64) -> Option<(f64, f64)> {
    let phi = lat.to_radians();
    let phi_0 = lat_0.to_radians();
    let d_lambda = (lon - lon_0).to_radians();
    let cos_c = phi_0.sin() * phi.sin() + phi_0.cos() * phi.cos() * d_lambda.cos();
    if cos_c < 0.0 {
        // Far side of the globe
        return None;
    }
    let nu = prime_vertical_radius(phi);
    let nu_0 = prime_vertical_radius(phi_0);
    let x = nu * phi.cos() * d_lambda.sin();
    let y = nu * (phi.sin() * phi_0.cos() - phi.cos() * phi_0.sin() * d_lambda.cos())
        + WGS84_E2 * (nu_0 * phi_0.sin() - nu * phi.sin()) * phi_0.cos();
    Some((x, y))
}

/// Newton iteration on the forward formulas, started from the spherical inverse.
fn orthographic_inverse(lat_0: f64, lon_0: f64, x: f64, y: f64) -> Option<(f64, f64)> {
    const STEP_DEG: f64 = 1e-7;

    let phi_0 = lat_0.to_radians();
    let rho = x.hypot(y);
    if rho > WGS84_A {
        return None;
    }
    if rho == 0.0 {
        return Some((lon_0, lat_0));
    }
    let c = (rho / WGS84_A).asin();
    let phi = (c.cos() * phi_0.sin() + y * c.sin() * phi_0.cos() / rho).asin();
    let lambda = (x * c.sin()).atan2(rho * c.cos() * phi_0.cos() - y * c.sin() * phi_0.sin());
    let (mut lon, mut lat) = (lon_0 + lambda.to_degrees(), phi.to_degrees());

    for _ in 0..20 {
        let (fx, fy) = orthographic_forward(lat_0, lon_0, lon, lat)?;
        let (ax, ay) = orthographic_forward(lat_0, lon_0, lon + STEP_DEG, lat)?;
        let (bx, by) = orthographic_forward(lat_0, lon_0, lon, lat + STEP_DEG)?;
        let (j11, j21) = ((ax - fx) / STEP_DEG, (ay - fy) / STEP_DEG);
        let (j12, j22) = ((bx - fx) / STEP_DEG, (by - fy) / STEP_DEG);
        let det = j11 * j22 - j12 * j21;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let (rx, ry) = (x - fx, y - fy);
        let d_lon = (rx * j22 - ry * j12) / det;
        let d_lat = (j11 * ry - j21 * rx) / det;
        lon += d_lon;
        lat += d_lat;
        if d_lon.abs() < 1e-12 && d_lat.abs() < 1e-12 {
            break;
        }
    }
    (lat.abs() <= 90.0).then_some((lon, lat))
}

#[derive(Debug, Clone, PartialEq)]
enum SrsKind {
    Local { name: String },
    Geographic,
    Projected { name: String, projection: Projection },
    Unsupported { wkt: String },
}

/// A coordinate system descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialReference {
    kind: SrsKind,
}

impl SpatialReference {
    /// A local (engineering) coordinate system
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            kind: SrsKind::Local { name: name.into() },
        }
    }

    /// WGS84 longitude/latitude in degrees
    pub fn wgs84() -> Self {
        Self {
            kind: SrsKind::Geographic,
        }
    }

    pub fn projected(name: impl Into<String>, projection: Projection) -> Self {
        Self {
            kind: SrsKind::Projected {
                name: name.into(),
                projection,
            },
        }
    }

    pub fn orthographic(lat_0: f64, lon_0: f64) -> Self {
        Self::projected("Orthographic SRS", Projection::Orthographic { lat_0, lon_0 })
    }

    pub fn utm(zone: u8, south: bool) -> Self {
        let hemisphere = if south { "S" } else { "N" };
        Self::projected(
            format!("WGS 84 / UTM zone {}{}", zone, hemisphere),
            Projection::Utm { zone, south },
        )
    }

    /// A reference the transformation layer cannot interpret
    pub fn unsupported(wkt: impl Into<String>) -> Self {
        Self {
            kind: SrsKind::Unsupported { wkt: wkt.into() },
        }
    }

    pub fn into_ref(self) -> SrsRef {
        Arc::new(self)
    }

    pub fn is_local(&self) -> bool {
        matches!(self.kind, SrsKind::Local { .. })
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self.kind, SrsKind::Geographic)
    }

    pub fn is_projected(&self) -> bool {
        matches!(self.kind, SrsKind::Projected { .. })
    }

    pub fn name(&self) -> &str {
        match &self.kind {
            SrsKind::Local { name } | SrsKind::Projected { name, .. } => name,
            SrsKind::Geographic => "WGS 84",
            SrsKind::Unsupported { .. } => "unknown",
        }
    }

    /// Parse a PROJ-style specification, e.g. `+proj=utm +zone=32 +datum=WGS84`.
    pub fn from_proj_string(spec: &str) -> Result<Self, GeoreferencingError> {
        let invalid = |reason: &str| GeoreferencingError::InvalidSpec {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        let mut params = Vec::new();
        for token in spec.split_whitespace() {
            let token = token
                .strip_prefix('+')
                .ok_or_else(|| invalid("parameters must start with '+'"))?;
            match token.split_once('=') {
                Some((key, value)) => params.push((key, Some(value))),
                None => params.push((token, None)),
            }
        }
        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| *k == key)
                .and_then(|(_, v)| *v)
        };
        let has = |key: &str| params.iter().any(|(k, _)| *k == key);
        let number = |key: &str, default: f64| -> Result<f64, GeoreferencingError> {
            match get(key) {
                Some(v) => v
                    .parse::<f64>()
                    .map_err(|_| invalid(&format!("invalid value for +{}", key))),
                None => Ok(default),
            }
        };

        if let Some(units) = get("units") {
            if units != "m" {
                return Err(invalid("only metric units are supported"));
            }
        }

        match get("proj") {
            Some("longlat") | Some("latlong") | Some("lonlat") | Some("latlon") => {
                Ok(Self::wgs84())
            }
            Some("ortho") => Ok(Self::projected(
                "Projected map SRS",
                Projection::Orthographic {
                    lat_0: number("lat_0", 0.0)?,
                    lon_0: number("lon_0", 0.0)?,
                },
            )),
            Some("tmerc") => Ok(Self::projected(
                "Projected map SRS",
                Projection::TransverseMercator {
                    lat_0: number("lat_0", 0.0)?,
                    lon_0: number("lon_0", 0.0)?,
                    k_0: number("k", number("k_0", 1.0)?)?,
                    x_0: number("x_0", 0.0)?,
                    y_0: number("y_0", 0.0)?,
                },
            )),
            Some("utm") => {
                let zone = get("zone")
                    .and_then(|z| z.parse::<u8>().ok())
                    .filter(|z| (1..=60).contains(z))
                    .ok_or_else(|| invalid("missing or invalid +zone"))?;
                Ok(Self::utm(zone, has("south")))
            }
            Some(other) => Err(invalid(&format!("unsupported projection '{}'", other))),
            None => Err(invalid("missing +proj")),
        }
    }

    /// PROJ-style specification, if the reference has one.
    pub fn to_proj_string(&self) -> Option<String> {
        match &self.kind {
            SrsKind::Geographic => Some("+proj=longlat +datum=WGS84 +no_defs".to_string()),
            SrsKind::Projected { projection, .. } => Some(match projection {
                Projection::Orthographic { lat_0, lon_0 } => format!(
                    "+proj=ortho +datum=WGS84 +ellps=WGS84 +units=m +lat_0={} +lon_0={} +no_defs",
                    format_number(*lat_0),
                    format_number(*lon_0)
                ),
                Projection::TransverseMercator {
                    lat_0,
                    lon_0,
                    k_0,
                    x_0,
                    y_0,
                } => format!(
                    "+proj=tmerc +lat_0={} +lon_0={} +k={} +x_0={} +y_0={} +datum=WGS84 +units=m +no_defs",
                    format_number(*lat_0),
                    format_number(*lon_0),
                    format_number(*k_0),
                    format_number(*x_0),
                    format_number(*y_0)
                ),
                Projection::Utm { zone, south } => format!(
                    "+proj=utm +zone={}{} +datum=WGS84 +units=m +no_defs",
                    zone,
                    if *south { " +south" } else { "" }
                ),
            }),
            SrsKind::Local { .. } | SrsKind::Unsupported { .. } => None,
        }
    }

    /// Multi-line WKT description, for messages.
    pub fn to_pretty_wkt(&self) -> String {
        const GEOGCS: &str = "    GEOGCS[\"WGS 84\",\n        DATUM[\"WGS_1984\",\n            SPHEROID[\"WGS 84\",6378137,298.257223563]],\n        PRIMEM[\"Greenwich\",0],\n        UNIT[\"degree\",0.0174532925199433]]";
        match &self.kind {
            SrsKind::Local { name } => format!("LOCAL_CS[\"{}\",\n    UNIT[\"metre\",1]]", name),
            SrsKind::Geographic => GEOGCS.trim_start().replace("\n    ", "\n"),
            SrsKind::Unsupported { wkt } => wkt.clone(),
            SrsKind::Projected { name, projection } => {
                let (method, params): (&str, Vec<(&str, f64)>) = match *projection {
                    Projection::Orthographic { lat_0, lon_0 } => (
                        "Orthographic",
                        vec![("latitude_of_origin", lat_0), ("central_meridian", lon_0)],
                    ),
                    _ => {
                        let (lat_0, lon_0, k_0, x_0, y_0) =
                            projection.as_transverse_mercator().unwrap_or_default();
                        (
                            "Transverse_Mercator",
                            vec![
                                ("latitude_of_origin", lat_0),
                                ("central_meridian", lon_0),
                                ("scale_factor", k_0),
                                ("false_easting", x_0),
                                ("false_northing", y_0),
                            ],
                        )
                    }
                };
                let mut wkt = format!(
                    "PROJCS[\"{}\",\n{},\n    PROJECTION[\"{}\"]",
                    name, GEOGCS, method
                );
                for (key, value) in params {
                    let _ = write!(wkt, ",\n    PARAMETER[\"{}\",{}]", key, format_number(value));
                }
                wkt.push_str(",\n    UNIT[\"metre\",1]]");
                wkt
            }
        }
    }

    fn to_geographic(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        match &self.kind {
            SrsKind::Geographic => Some((x, y)),
            SrsKind::Projected { projection, .. } => projection.inverse(x, y),
            _ => None,
        }
    }

    fn from_geographic(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        match &self.kind {
            SrsKind::Geographic => Some((lon, lat)),
            SrsKind::Projected { projection, .. } => projection.forward(lon, lat),
            _ => None,
        }
    }

    fn is_transformable(&self) -> bool {
        matches!(self.kind, SrsKind::Geographic | SrsKind::Projected { .. })
    }
}

#[derive(Debug, Clone)]
enum TransformKind {
    Identity,
    ViaGeographic,
    #[cfg(feature = "proj")]
    Proj(ProjPipeline),
}

/// A PROJ transformation between two references with PROJ definitions
#[cfg(feature = "proj")]
#[derive(Clone)]
struct ProjPipeline(std::rc::Rc<proj::Proj>);

#[cfg(feature = "proj")]
impl ProjPipeline {
    fn new(source: &SpatialReference, target: &SpatialReference) -> Option<Self> {
        let from = format!("{} +type=crs", source.to_proj_string()?);
        let to = format!("{} +type=crs", target.to_proj_string()?);
        match proj::Proj::new_known_crs(&from, &to, None) {
            Ok(pipeline) => Some(Self(std::rc::Rc::new(pipeline))),
            Err(e) => {
                tracing::warn!("PROJ cannot transform {} to {}: {}", from, to, e);
                None
            }
        }
    }

    fn convert(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        self.0.convert((x, y)).ok()
    }
}

#[cfg(feature = "proj")]
impl std::fmt::Debug for ProjPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ProjPipeline")
    }
}

/// A transformation between two spatial references
#[derive(Debug, Clone)]
pub struct CoordinateTransform {
    source: SrsRef,
    target: SrsRef,
    kind: TransformKind,
}

impl CoordinateTransform {
    /// Build a transformation; `None` if the references are incompatible.
    pub fn new(source: &SrsRef, target: &SrsRef) -> Option<Self> {
        let kind = match (&source.kind, &target.kind) {
            (SrsKind::Local { name: a }, SrsKind::Local { name: b }) if a == b => {
                TransformKind::Identity
            }
            _ if !source.is_transformable() || !target.is_transformable() => return None,
            _ if source == target => TransformKind::Identity,
            #[cfg(feature = "proj")]
            _ => ProjPipeline::new(source, target)
                .map_or(TransformKind::ViaGeographic, TransformKind::Proj),
            #[cfg(not(feature = "proj"))]
            _ => TransformKind::ViaGeographic,
        };
        Some(Self {
            source: Arc::clone(source),
            target: Arc::clone(target),
            kind,
        })
    }

    pub fn source(&self) -> &SrsRef {
        &self.source
    }

    pub fn target(&self) -> &SrsRef {
        &self.target
    }

    /// Transform one coordinate; `None` if it lies outside the valid domain.
    pub fn transform(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let (tx, ty) = match &self.kind {
            TransformKind::Identity => return Some((x, y)),
            TransformKind::ViaGeographic => {
                let (lon, lat) = self.source.to_geographic(x, y)?;
                if !lon.is_finite() || !lat.is_finite() || lat.abs() > 90.0 {
                    return None;
                }
                self.target.from_geographic(lon, lat)?
            }
            #[cfg(feature = "proj")]
            TransformKind::Proj(pipeline) => pipeline.convert(x, y)?,
        };
        (tx.is_finite() && ty.is_finite()).then_some((tx, ty))
    }
}
