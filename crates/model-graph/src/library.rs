//! The built-in transfer-function library.
//!
//! Each entry names a derived variable, the variables it is computed from,
//! and a pure per-chunk kernel. Kernels see one rectangular window of one
//! bin at a time and never touch neighbouring cells, which is what makes
//! chunked parallel evaluation safe. Nodata (NaN) propagates through every
//! formula arithmetically.
//!
//! The chain follows the ETLook surface-energy-balance formulation: optical
//! inputs drive vegetation cover and leaf area, meteorology drives the
//! Penman-Monteith resistances, and the two meet in daily transpiration,
//! soil evaporation and reference evapotranspiration. A light-use
//! efficiency branch derives net primary production from the same stress
//! factors.
//!
//! Two entries, `lat` and `doy`, have no dependencies: they are synthesized
//! from the evaluation context (grid geometry and bin midpoint) and give
//! the astronomy nodes their inputs without requiring rasters for them.

use crate::error::TransferError;
use chrono::Datelike;
use raster_common::{BinPeriod, GridDefinition, PixelWindow};

/// Everything a kernel may know besides its dependency chunks: where the
/// window sits on the grid and which bin is being evaluated.
pub struct ChunkContext<'a> {
    pub grid: &'a GridDefinition,
    pub window: PixelWindow,
    pub period: &'a BinPeriod,
}

impl ChunkContext<'_> {
    /// Number of cells in the evaluation window.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Whether the window is degenerate.
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Per-cell latitude in degrees, row-major over the window.
    pub fn latitudes(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.len());
        for row in self.window.row..self.window.row + self.window.height {
            let (_, lat) = self.grid.cell_to_coords(self.window.col, row);
            for _ in 0..self.window.width {
                out.push(lat as f32);
            }
        }
        out
    }

    /// Day of year at the bin midpoint.
    pub fn day_of_year(&self) -> f32 {
        self.period.midpoint().ordinal() as f32
    }
}

/// A per-chunk kernel: dependency chunks in, one output chunk out.
pub type ChunkFn = fn(&ChunkContext, &[&[f32]]) -> Result<Vec<f32>, TransferError>;

/// One library entry.
#[derive(Debug)]
pub struct TransferSpec {
    pub name: &'static str,
    pub deps: &'static [&'static str],
    pub func: ChunkFn,
}

/// The outputs a standard run produces when the caller does not choose:
/// interception, transpiration, soil evaporation, total actual ET,
/// reference ET and net primary production.
pub const DEFAULT_OUTPUTS: &[&str] = &[
    "int_mm",
    "t_24_mm",
    "e_24_mm",
    "aeti_24_mm",
    "et_ref_24_mm",
    "npp",
];

/// Look up a library entry by name.
pub fn find(name: &str) -> Option<&'static TransferSpec> {
    LIBRARY.iter().find(|spec| spec.name == name)
}

/// The full library in definition order.
pub fn library() -> &'static [TransferSpec] {
    LIBRARY
}

/// Names referenced as dependencies but not defined by the library; these
/// must arrive as composited input variables.
pub fn input_variables() -> Vec<&'static str> {
    let mut inputs: Vec<&'static str> = LIBRARY
        .iter()
        .flat_map(|spec| spec.deps.iter().copied())
        .filter(|dep| find(dep).is_none())
        .collect();
    inputs.sort_unstable();
    inputs.dedup();
    inputs
}

// NDVI-to-cover calibration.
const ND_MIN: f32 = 0.125;
const ND_MAX: f32 = 0.8;
const VC_POW: f32 = 0.7;
const LAI_POW: f32 = -0.45;
const VC_MAX: f32 = 0.98;

// Canopy and soil resistances.
const RS_MIN: f32 = 70.0;
const R_SOIL_MIN: f32 = 800.0;
const R_SOIL_POW: f32 = -2.1;

// Aerodynamics.
const Z_OBS: f32 = 10.0;
const Z0_SOIL: f32 = 0.001;
const VON_KARMAN: f32 = 0.41;
const U_MIN: f32 = 0.1;

// Radiation and thermodynamics.
const SOLAR_CONSTANT: f32 = 1367.0;
const STEFAN_BOLTZMANN: f32 = 5.67e-8;
const CP_AIR: f32 = 1004.0;
const GAS_CONSTANT_DRY: f32 = 287.04;
const GRASS_ALBEDO: f32 = 0.23;
const G0_FRACTION: f32 = 0.25;
const DAY_SECONDS: f32 = 86_400.0;

// Light-use efficiency.
const LUE_MAX: f32 = 2.5;
const PAR_FRACTION: f32 = 0.48;
const WM2_TO_MJ_DAY: f32 = 0.0864;

const PI: f32 = std::f32::consts::PI;

/// Checked conversion of the dependency slice to a fixed arity, verifying
/// every chunk matches the window shape.
fn args<'a, const N: usize>(
    ctx: &ChunkContext,
    deps: &[&'a [f32]],
) -> Result<[&'a [f32]; N], TransferError> {
    if deps.len() != N {
        return Err(TransferError::Arity {
            expected: N,
            actual: deps.len(),
        });
    }
    for dep in deps {
        if dep.len() != ctx.len() {
            return Err(TransferError::ShapeMismatch {
                expected: ctx.len(),
                actual: dep.len(),
            });
        }
    }
    let mut out = [&[] as &[f32]; N];
    out.copy_from_slice(deps);
    Ok(out)
}

fn map1(
    ctx: &ChunkContext,
    deps: &[&[f32]],
    f: impl Fn(f32) -> f32,
) -> Result<Vec<f32>, TransferError> {
    let [a] = args::<1>(ctx, deps)?;
    Ok(a.iter().map(|&a| f(a)).collect())
}

fn map2(
    ctx: &ChunkContext,
    deps: &[&[f32]],
    f: impl Fn(f32, f32) -> f32,
) -> Result<Vec<f32>, TransferError> {
    let [a, b] = args::<2>(ctx, deps)?;
    Ok(a.iter().zip(b).map(|(&a, &b)| f(a, b)).collect())
}

fn map3(
    ctx: &ChunkContext,
    deps: &[&[f32]],
    f: impl Fn(f32, f32, f32) -> f32,
) -> Result<Vec<f32>, TransferError> {
    let [a, b, c] = args::<3>(ctx, deps)?;
    let mut out = Vec::with_capacity(a.len());
    for i in 0..a.len() {
        out.push(f(a[i], b[i], c[i]));
    }
    Ok(out)
}

fn map4(
    ctx: &ChunkContext,
    deps: &[&[f32]],
    f: impl Fn(f32, f32, f32, f32) -> f32,
) -> Result<Vec<f32>, TransferError> {
    let [a, b, c, d] = args::<4>(ctx, deps)?;
    let mut out = Vec::with_capacity(a.len());
    for i in 0..a.len() {
        out.push(f(a[i], b[i], c[i], d[i]));
    }
    Ok(out)
}

// --- context-derived sources ---------------------------------------------

fn lat(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    args::<0>(ctx, deps)?;
    Ok(ctx.latitudes())
}

fn doy(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    args::<0>(ctx, deps)?;
    Ok(vec![ctx.day_of_year(); ctx.len()])
}

// --- astronomy -----------------------------------------------------------

fn lat_rad(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map1(ctx, deps, |lat| lat.to_radians())
}

fn decl(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map1(ctx, deps, |doy| 0.409 * (2.0 * PI * doy / 365.0 - 1.39).sin())
}

fn iesd(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map1(ctx, deps, |doy| 1.0 + 0.033 * (2.0 * PI * doy / 365.0).cos())
}

fn ws(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map2(ctx, deps, |lat, decl| {
        (-lat.tan() * decl.tan()).clamp(-1.0, 1.0).acos()
    })
}

fn ra_toa_flat_24(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map4(ctx, deps, |decl, iesd, lat, ws| {
        (SOLAR_CONSTANT / PI)
            * iesd
            * (ws * lat.sin() * decl.sin() + lat.cos() * decl.cos() * ws.sin())
    })
}

fn trans_24(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map2(ctx, deps, |ra, ra_toa| (ra / ra_toa).clamp(0.0, 1.0))
}

// --- vegetation ----------------------------------------------------------

fn vc(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map1(ctx, deps, |ndvi| {
        let frac = ((ND_MAX - ndvi) / (ND_MAX - ND_MIN)).clamp(0.0, 1.0);
        (1.0 - frac.powf(VC_POW)).clamp(0.0, VC_MAX)
    })
}

fn lai(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map1(ctx, deps, |vc| (1.0 - vc).ln() / LAI_POW)
}

fn lai_eff(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map1(ctx, deps, |lai| lai / (0.3 * lai + 1.2))
}

fn sf_soil(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map1(ctx, deps, |lai| (-0.6 * lai).exp())
}

fn int_mm(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map3(ctx, deps, |p, vc, lai| {
        let capacity = 0.2 * lai;
        if capacity <= 0.0 {
            if p.is_nan() || vc.is_nan() {
                f32::NAN
            } else {
                0.0
            }
        } else {
            capacity * (1.0 - 1.0 / (1.0 + vc * p / capacity))
        }
    })
}

// --- stress factors ------------------------------------------------------

fn stress_rad(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map1(ctx, deps, |ra| {
        (ra / (ra + 60.0) * (1.0 + 60.0 / 500.0)).clamp(0.0, 1.0)
    })
}

fn stress_vpd(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map1(ctx, deps, |vpd| {
        (1.0 - 0.3 * (vpd / 10.0 + 0.5).ln()).clamp(0.0, 1.0)
    })
}

fn stress_temp(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    // Ramp between 0 and 50 C with an optimum at 25 C.
    map1(ctx, deps, |t| (t * (50.0 - t) / 625.0).clamp(0.0, 1.0))
}

fn stress_moist(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map1(ctx, deps, |se| {
        let tenacity = 1.5;
        (tenacity * se - (2.0 * PI * se).sin() / (2.0 * PI)).clamp(0.0, 1.0)
    })
}

// --- meteorology ---------------------------------------------------------

fn t_air_k_24(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map1(ctx, deps, |t| t + 273.15)
}

fn svp_24(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    // Saturated vapour pressure in mbar, air temperature in C.
    map1(ctx, deps, |t| 6.108 * (17.27 * t / (t + 237.3)).exp())
}

fn vpd_24(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map2(ctx, deps, |svp, vp| (svp - vp).max(0.0))
}

fn lh_24(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    // Latent heat of vaporization in J/kg.
    map1(ctx, deps, |t| (2501.0 - 2.361 * t) * 1000.0)
}

fn psy_24(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    // Psychrometric constant in mbar/K, air pressure in mbar.
    map1(ctx, deps, |p_air| 0.000665 * p_air)
}

fn ssvp_24(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    // Slope of the saturated vapour pressure curve in mbar/K.
    map2(ctx, deps, |svp, t| {
        4098.0 * svp / ((t + 237.3) * (t + 237.3))
    })
}

fn ad_24(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    // Air density in kg/m3, pressure converted from mbar to Pa.
    map2(ctx, deps, |p_air, t_k| {
        p_air * 100.0 / (GAS_CONSTANT_DRY * t_k)
    })
}

// --- resistances ---------------------------------------------------------

fn r_canopy_0(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map4(ctx, deps, |lai_eff, s_rad, s_vpd, s_temp| {
        RS_MIN / (lai_eff * s_rad * s_vpd * s_temp)
    })
}

fn r_canopy(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map2(ctx, deps, |r0, s_moist| r0 / s_moist)
}

fn r_soil(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map1(ctx, deps, |se| R_SOIL_MIN * se.powf(R_SOIL_POW))
}

fn z0m(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map1(ctx, deps, |lai| 0.001 + 0.018 * lai)
}

fn ra_canopy_init(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map2(ctx, deps, |u, z0m| {
        let u = u.max(U_MIN);
        (Z_OBS / z0m).ln() * (Z_OBS / (0.1 * z0m)).ln() / (VON_KARMAN * VON_KARMAN * u)
    })
}

fn ra_soil_init(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map1(ctx, deps, |u| {
        let u = u.max(U_MIN);
        (Z_OBS / Z0_SOIL).ln() * (Z_OBS / (0.1 * Z0_SOIL)).ln() / (VON_KARMAN * VON_KARMAN * u)
    })
}

// --- radiation balance ---------------------------------------------------

fn l_net(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map3(ctx, deps, |t_k, vp, trans| {
        let vp_kpa = vp / 10.0;
        let emissivity = 0.34 - 0.14 * vp_kpa.max(0.0).sqrt();
        let cloud = 1.35 * (trans / 0.75).min(1.0) - 0.35;
        (STEFAN_BOLTZMANN * t_k.powi(4) * emissivity * cloud).max(0.0)
    })
}

fn int_wm2(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map2(ctx, deps, |int_mm, lh| int_mm * lh / DAY_SECONDS)
}

fn rn_24(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map4(ctx, deps, |r0, ra, l_net, int_wm2| {
        (1.0 - r0) * ra - l_net - int_wm2
    })
}

fn rn_24_canopy(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map2(ctx, deps, |rn, sf_soil| rn * (1.0 - sf_soil))
}

fn rn_24_soil(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map2(ctx, deps, |rn, sf_soil| rn * sf_soil)
}

fn rn_24_grass(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map2(ctx, deps, |ra, l_net| (1.0 - GRASS_ALBEDO) * ra - l_net)
}

fn g0_24(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map1(ctx, deps, |rn_soil| G0_FRACTION * rn_soil)
}

// --- evapotranspiration --------------------------------------------------

fn t_24(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    let [rn, ssvp, ad, vpd, psy, r_can, ra_can] = args::<7>(ctx, deps)?;
    let mut out = Vec::with_capacity(rn.len());
    for i in 0..rn.len() {
        let numer = ssvp[i] * rn[i] + ad[i] * CP_AIR * vpd[i] / ra_can[i];
        let denom = ssvp[i] + psy[i] * (1.0 + r_can[i] / ra_can[i]);
        out.push((numer / denom).max(0.0));
    }
    Ok(out)
}

fn e_24(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    let [rn_soil, g0, ssvp, ad, vpd, psy, r_soil, ra_soil] = args::<8>(ctx, deps)?;
    let mut out = Vec::with_capacity(rn_soil.len());
    for i in 0..rn_soil.len() {
        let numer = ssvp[i] * (rn_soil[i] - g0[i]) + ad[i] * CP_AIR * vpd[i] / ra_soil[i];
        let denom = ssvp[i] + psy[i] * (1.0 + r_soil[i] / ra_soil[i]);
        out.push((numer / denom).max(0.0));
    }
    Ok(out)
}

fn et_ref_24(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    // FAO-56 style reference ET over a grass surface, ra = 208/u.
    let [rn_grass, ssvp, ad, vpd, psy, u] = args::<6>(ctx, deps)?;
    let mut out = Vec::with_capacity(rn_grass.len());
    for i in 0..rn_grass.len() {
        let u_eff = u[i].max(U_MIN);
        let numer = ssvp[i] * rn_grass[i] + ad[i] * CP_AIR * vpd[i] * u_eff / 208.0;
        let denom = ssvp[i] + psy[i] * (1.0 + 0.34 * u_eff);
        out.push((numer / denom).max(0.0));
    }
    Ok(out)
}

fn t_24_mm(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map2(ctx, deps, |t, lh| (t * DAY_SECONDS / lh).max(0.0))
}

fn e_24_mm(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map2(ctx, deps, |e, lh| (e * DAY_SECONDS / lh).max(0.0))
}

fn et_ref_24_mm(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map2(ctx, deps, |et, lh| (et * DAY_SECONDS / lh).max(0.0))
}

fn aeti_24_mm(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map3(ctx, deps, |e, t, int| e + t + int)
}

// --- primary production --------------------------------------------------

fn f_par(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map1(ctx, deps, |ndvi| (1.257 * ndvi - 0.161).clamp(0.0, 1.0))
}

fn apar(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map2(ctx, deps, |ra, f_par| PAR_FRACTION * ra * f_par)
}

fn lue(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    map1(ctx, deps, |s_temp| LUE_MAX * s_temp)
}

fn npp(ctx: &ChunkContext, deps: &[&[f32]]) -> Result<Vec<f32>, TransferError> {
    // gC/m2/day from absorbed radiation and the two limiting stresses.
    map3(ctx, deps, |apar, lue, s_moist| {
        apar * WM2_TO_MJ_DAY * lue * s_moist
    })
}

static LIBRARY: &[TransferSpec] = &[
    TransferSpec { name: "lat", deps: &[], func: lat },
    TransferSpec { name: "doy", deps: &[], func: doy },
    TransferSpec { name: "lat_rad", deps: &["lat"], func: lat_rad },
    TransferSpec { name: "decl", deps: &["doy"], func: decl },
    TransferSpec { name: "iesd", deps: &["doy"], func: iesd },
    TransferSpec { name: "ws", deps: &["lat_rad", "decl"], func: ws },
    TransferSpec {
        name: "ra_toa_flat_24",
        deps: &["decl", "iesd", "lat_rad", "ws"],
        func: ra_toa_flat_24,
    },
    TransferSpec { name: "trans_24", deps: &["ra_24", "ra_toa_flat_24"], func: trans_24 },
    TransferSpec { name: "vc", deps: &["ndvi"], func: vc },
    TransferSpec { name: "lai", deps: &["vc"], func: lai },
    TransferSpec { name: "lai_eff", deps: &["lai"], func: lai_eff },
    TransferSpec { name: "sf_soil", deps: &["lai"], func: sf_soil },
    TransferSpec { name: "int_mm", deps: &["p_24", "vc", "lai"], func: int_mm },
    TransferSpec { name: "stress_rad", deps: &["ra_24"], func: stress_rad },
    TransferSpec { name: "stress_vpd", deps: &["vpd_24"], func: stress_vpd },
    TransferSpec { name: "stress_temp", deps: &["t_air_24"], func: stress_temp },
    TransferSpec { name: "stress_moist", deps: &["se_root"], func: stress_moist },
    TransferSpec { name: "t_air_k_24", deps: &["t_air_24"], func: t_air_k_24 },
    TransferSpec { name: "svp_24", deps: &["t_air_24"], func: svp_24 },
    TransferSpec { name: "vpd_24", deps: &["svp_24", "vp_24"], func: vpd_24 },
    TransferSpec { name: "lh_24", deps: &["t_air_24"], func: lh_24 },
    TransferSpec { name: "psy_24", deps: &["p_air_24"], func: psy_24 },
    TransferSpec { name: "ssvp_24", deps: &["svp_24", "t_air_24"], func: ssvp_24 },
    TransferSpec { name: "ad_24", deps: &["p_air_24", "t_air_k_24"], func: ad_24 },
    TransferSpec {
        name: "r_canopy_0",
        deps: &["lai_eff", "stress_rad", "stress_vpd", "stress_temp"],
        func: r_canopy_0,
    },
    TransferSpec { name: "r_canopy", deps: &["r_canopy_0", "stress_moist"], func: r_canopy },
    TransferSpec { name: "r_soil", deps: &["se_root"], func: r_soil },
    TransferSpec { name: "z0m", deps: &["lai"], func: z0m },
    TransferSpec { name: "ra_canopy_init", deps: &["u_24", "z0m"], func: ra_canopy_init },
    TransferSpec { name: "ra_soil_init", deps: &["u_24"], func: ra_soil_init },
    TransferSpec { name: "l_net", deps: &["t_air_k_24", "vp_24", "trans_24"], func: l_net },
    TransferSpec { name: "int_wm2", deps: &["int_mm", "lh_24"], func: int_wm2 },
    TransferSpec { name: "rn_24", deps: &["r0", "ra_24", "l_net", "int_wm2"], func: rn_24 },
    TransferSpec { name: "rn_24_canopy", deps: &["rn_24", "sf_soil"], func: rn_24_canopy },
    TransferSpec { name: "rn_24_soil", deps: &["rn_24", "sf_soil"], func: rn_24_soil },
    TransferSpec { name: "rn_24_grass", deps: &["ra_24", "l_net"], func: rn_24_grass },
    TransferSpec { name: "g0_24", deps: &["rn_24_soil"], func: g0_24 },
    TransferSpec {
        name: "t_24",
        deps: &[
            "rn_24_canopy",
            "ssvp_24",
            "ad_24",
            "vpd_24",
            "psy_24",
            "r_canopy",
            "ra_canopy_init",
        ],
        func: t_24,
    },
    TransferSpec {
        name: "e_24",
        deps: &[
            "rn_24_soil",
            "g0_24",
            "ssvp_24",
            "ad_24",
            "vpd_24",
            "psy_24",
            "r_soil",
            "ra_soil_init",
        ],
        func: e_24,
    },
    TransferSpec {
        name: "et_ref_24",
        deps: &["rn_24_grass", "ssvp_24", "ad_24", "vpd_24", "psy_24", "u_24"],
        func: et_ref_24,
    },
    TransferSpec { name: "t_24_mm", deps: &["t_24", "lh_24"], func: t_24_mm },
    TransferSpec { name: "e_24_mm", deps: &["e_24", "lh_24"], func: e_24_mm },
    TransferSpec { name: "et_ref_24_mm", deps: &["et_ref_24", "lh_24"], func: et_ref_24_mm },
    TransferSpec { name: "aeti_24_mm", deps: &["e_24_mm", "t_24_mm", "int_mm"], func: aeti_24_mm },
    TransferSpec { name: "f_par", deps: &["ndvi"], func: f_par },
    TransferSpec { name: "apar", deps: &["ra_24", "f_par"], func: apar },
    TransferSpec { name: "lue", deps: &["stress_temp"], func: lue },
    TransferSpec { name: "npp", deps: &["apar", "lue", "stress_moist"], func: npp },
];
