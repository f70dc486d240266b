//! Wavelet catalog
//!
//! Immutable filter banks keyed by name. Orthogonal families carry a single
//! scaling filter from which the remaining three are derived (QMF); the
//! biorthogonal spline families carry independent decomposition and
//! reconstruction pairs plus their synthesis group delay. Continuous
//! wavelets are catalog members but non-participants in the MODWT.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};
use vw_core::{TransformError, TransformResult};

/// Wavelet family classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaveletKind {
    /// Orthonormal filter bank; synthesis reuses the analysis filters
    Orthogonal,
    /// Independent analysis/synthesis pairs with a synthesis group delay
    Biorthogonal,
    /// Continuous-transform wavelet; rejected by MODWT entry points
    Continuous,
}

/// Immutable wavelet record
///
/// `h0`/`h1` are the decomposition low/high-pass filters, `g0`/`g1` the
/// reconstruction pair. Filters are shared without synchronization; the
/// catalog guarantees the admissibility sums.
#[derive(Debug, Clone)]
pub struct Wavelet {
    name: &'static str,
    kind: WaveletKind,
    h0: Arc<[f64]>,
    h1: Arc<[f64]>,
    g0: Arc<[f64]>,
    g1: Arc<[f64]>,
    group_delay: usize,
}

impl Wavelet {
    /// Build an orthogonal wavelet from its scaling filter
    ///
    /// The high-pass is the QMF mirror of the low-pass; reconstruction
    /// filters equal the decomposition filters.
    fn orthogonal(name: &'static str, lo_d: Vec<f64>) -> Self {
        let hi_d: Vec<f64> = lo_d
            .iter()
            .enumerate()
            .map(|(i, &x)| if i % 2 == 0 { -x } else { x })
            .rev()
            .collect();

        let h0: Arc<[f64]> = lo_d.into();
        let h1: Arc<[f64]> = hi_d.into();
        Self {
            name,
            kind: WaveletKind::Orthogonal,
            g0: Arc::clone(&h0),
            g1: Arc::clone(&h1),
            h0,
            h1,
            group_delay: 0,
        }
    }

    /// Build a biorthogonal wavelet from explicit filter pairs
    fn biorthogonal(
        name: &'static str,
        dec_lo: Vec<f64>,
        dec_hi: Vec<f64>,
        rec_lo: Vec<f64>,
        rec_hi: Vec<f64>,
        group_delay: usize,
    ) -> Self {
        debug_assert_eq!(dec_lo.len(), dec_hi.len());
        debug_assert_eq!(dec_lo.len(), rec_lo.len());
        debug_assert_eq!(dec_lo.len(), rec_hi.len());
        Self {
            name,
            kind: WaveletKind::Biorthogonal,
            h0: dec_lo.into(),
            h1: dec_hi.into(),
            g0: rec_lo.into(),
            g1: rec_hi.into(),
            group_delay,
        }
    }

    /// Catalog entry for a continuous wavelet (no discrete filters)
    fn continuous(name: &'static str) -> Self {
        let empty: Arc<[f64]> = Vec::new().into();
        Self {
            name,
            kind: WaveletKind::Continuous,
            h0: Arc::clone(&empty),
            h1: Arc::clone(&empty),
            g0: Arc::clone(&empty),
            g1: empty,
            group_delay: 0,
        }
    }

    /// Stable identifier
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Family classification
    pub fn kind(&self) -> WaveletKind {
        self.kind
    }

    /// Decomposition low-pass filter
    pub fn h0(&self) -> &Arc<[f64]> {
        &self.h0
    }

    /// Decomposition high-pass filter
    pub fn h1(&self) -> &Arc<[f64]> {
        &self.h1
    }

    /// Reconstruction low-pass filter
    pub fn g0(&self) -> &Arc<[f64]> {
        &self.g0
    }

    /// Reconstruction high-pass filter
    pub fn g1(&self) -> &Arc<[f64]> {
        &self.g1
    }

    /// Cyclic synthesis delay in samples (0 for orthogonal wavelets)
    pub fn group_delay(&self) -> usize {
        self.group_delay
    }

    /// Filter length L
    pub fn filter_len(&self) -> usize {
        self.h0.len()
    }

    /// Whether this wavelet participates in the MODWT
    pub fn supports_modwt(&self) -> bool {
        self.kind != WaveletKind::Continuous
    }
}

/// Stable catalog order; enumerations iterate in this order
const CATALOG_ORDER: &[&str] = &[
    "haar", "db2", "db3", "db4", "db6", "db8", "sym4", "sym8", "coif1", "coif2", "bior1_3",
    "bior1_5", "bior2_2", "morlet", "mexican_hat",
];

fn build_catalog() -> BTreeMap<&'static str, Wavelet> {
    let mut map = BTreeMap::new();

    let mut insert = |w: Wavelet| {
        map.insert(w.name, w);
    };

    insert(Wavelet::orthogonal(
        "haar",
        vec![0.7071067811865476, 0.7071067811865476],
    ));
    insert(Wavelet::orthogonal(
        "db2",
        vec![
            0.4829629131445341, 0.8365163037378079,
            0.2241438680420134, -0.1294095225512604,
        ],
    ));
    insert(Wavelet::orthogonal(
        "db3",
        vec![
            0.3326705529500826, 0.8068915093110925,
            0.4598775021184915, -0.1350110200102546,
            -0.0854412738820267, 0.0352262918857095,
        ],
    ));
    insert(Wavelet::orthogonal(
        "db4",
        vec![
            0.2303778133088965, 0.7148465705529156,
            0.6308807679298589, -0.0279837694168599,
            -0.1870348117190930, 0.0308413818355607,
            0.0328830116668852, -0.0105974017850690,
        ],
    ));
    insert(Wavelet::orthogonal(
        "db6",
        vec![
            0.1115407433501095, 0.4946238903984533,
            0.7511339080210959, 0.3152503517091982,
            -0.2262646939654400, -0.1297668675672625,
            0.0975016055873225, 0.0275228655303053,
            -0.0315820393174862, 0.0005538422011614,
            0.0047772575109455, -0.0010773010853085,
        ],
    ));
    insert(Wavelet::orthogonal(
        "db8",
        vec![
            0.0544158422431049, 0.3128715909143031,
            0.6756307362972904, 0.5853546836541907,
            -0.0158291052563816, -0.2840155429615702,
            0.0004724845739124, 0.1287474266204837,
            -0.0173693010018083, -0.0440882539307952,
            0.0139810279173995, 0.0087460940474061,
            -0.0048703529934518, -0.0003917403733770,
            0.0006754494064506, -0.0001174767841248,
        ],
    ));
    insert(Wavelet::orthogonal(
        "sym4",
        vec![
            -0.0757657147893407, -0.0296355276459541,
            0.4976186676324578, 0.8037387518052163,
            0.2978577956055422, -0.0992195435769354,
            -0.0126039672622612, 0.0322231006040713,
        ],
    ));
    insert(Wavelet::orthogonal(
        "sym8",
        vec![
            -0.0033824159513594, -0.0005421323316355,
            0.0316950878103452, 0.0076074873252848,
            -0.1432942383510542, -0.0612733590679088,
            0.4813596512592012, 0.7771857516997478,
            0.3644418948359564, -0.0519458381078751,
            -0.0272190299168137, 0.0491371796734768,
            0.0038087520140601, -0.0149522583367926,
            -0.0003029205145516, 0.0018899503329007,
        ],
    ));
    insert(Wavelet::orthogonal(
        "coif1",
        vec![
            -0.0156557285289848, -0.0727326213410511,
            0.3848648565381134, 0.8525720416423900,
            0.3378976709511590, -0.0727322757411889,
        ],
    ));
    insert(Wavelet::orthogonal(
        "coif2",
        vec![
            0.0011945726958388, -0.0016290733601404,
            -0.0189155298252868, 0.0211018340249299,
            0.0997835515523118, -0.0975016055873225,
            -0.2262646939654400, 0.3152503517091982,
            0.7511339080210959, 0.4946238903984533,
            0.1115407433501095, -0.0315820393174862,
        ],
    ));

    // Biorthogonal spline families. The synthesis product
    // G0(z)H0(z) + G1(z)H1(z) equals 2 z^-(L-1), so the convolution
    // synthesis path compensates a cyclic delay of L-1 samples.
    insert(Wavelet::biorthogonal(
        "bior1_3",
        vec![
            -0.0883883476483184, 0.0883883476483184,
            0.7071067811865476, 0.7071067811865476,
            0.0883883476483184, -0.0883883476483184,
        ],
        vec![
            0.0, 0.0,
            -0.7071067811865476, 0.7071067811865476,
            0.0, 0.0,
        ],
        vec![
            0.0, 0.0,
            0.7071067811865476, 0.7071067811865476,
            0.0, 0.0,
        ],
        vec![
            -0.0883883476483184, -0.0883883476483184,
            0.7071067811865476, -0.7071067811865476,
            0.0883883476483184, 0.0883883476483184,
        ],
        5,
    ));
    insert(Wavelet::biorthogonal(
        "bior1_5",
        vec![
            0.0165728151840597, -0.0165728151840597,
            -0.1215339780164378, 0.1215339780164378,
            0.7071067811865476, 0.7071067811865476,
            0.1215339780164378, -0.1215339780164378,
            -0.0165728151840597, 0.0165728151840597,
        ],
        vec![
            0.0, 0.0, 0.0, 0.0,
            -0.7071067811865476, 0.7071067811865476,
            0.0, 0.0, 0.0, 0.0,
        ],
        vec![
            0.0, 0.0, 0.0, 0.0,
            0.7071067811865476, 0.7071067811865476,
            0.0, 0.0, 0.0, 0.0,
        ],
        vec![
            0.0165728151840597, 0.0165728151840597,
            -0.1215339780164378, -0.1215339780164378,
            0.7071067811865476, -0.7071067811865476,
            0.1215339780164378, 0.1215339780164378,
            -0.0165728151840597, -0.0165728151840597,
        ],
        9,
    ));
    insert(Wavelet::biorthogonal(
        "bior2_2",
        vec![
            0.0, -0.1767766952966369,
            0.3535533905932738, 1.0606601717798214,
            0.3535533905932738, -0.1767766952966369,
        ],
        vec![
            0.0, 0.3535533905932738,
            -0.7071067811865476, 0.3535533905932738,
            0.0, 0.0,
        ],
        vec![
            0.0, 0.3535533905932738,
            0.7071067811865476, 0.3535533905932738,
            0.0, 0.0,
        ],
        vec![
            0.0, -0.1767766952966369,
            -0.3535533905932738, 1.0606601717798214,
            -0.3535533905932738, -0.1767766952966369,
        ],
        5,
    ));

    // Continuous wavelets are catalog members so lookups resolve, but the
    // MODWT entry points reject them.
    insert(Wavelet::continuous("morlet"));
    insert(Wavelet::continuous("mexican_hat"));

    map
}

fn catalog() -> &'static BTreeMap<&'static str, Wavelet> {
    static CATALOG: OnceLock<BTreeMap<&'static str, Wavelet>> = OnceLock::new();
    CATALOG.get_or_init(build_catalog)
}

/// Look up a wavelet by name
///
/// Names are case-insensitive; `.` and `-` are accepted as separators
/// (`bior1.3` resolves to `bior1_3`).
pub fn get_wavelet(name: &str) -> TransformResult<Wavelet> {
    let normalized: String = name
        .trim()
        .to_ascii_lowercase()
        .replace(['.', '-'], "_");
    catalog()
        .get(normalized.as_str())
        .cloned()
        .ok_or_else(|| TransformError::UnknownWavelet {
            name: name.to_string(),
        })
}

fn wavelets_of_kind(kind: WaveletKind) -> Vec<Wavelet> {
    let map = catalog();
    CATALOG_ORDER
        .iter()
        .filter_map(|name| map.get(name))
        .filter(|w| w.kind == kind)
        .cloned()
        .collect()
}

/// All orthogonal wavelets, in stable catalog order
pub fn orthogonal_wavelets() -> Vec<Wavelet> {
    wavelets_of_kind(WaveletKind::Orthogonal)
}

/// All biorthogonal wavelets, in stable catalog order
pub fn biorthogonal_wavelets() -> Vec<Wavelet> {
    wavelets_of_kind(WaveletKind::Biorthogonal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SQRT2: f64 = std::f64::consts::SQRT_2;

    #[test]
    fn test_lookup_and_aliases() {
        assert_eq!(get_wavelet("haar").unwrap().name(), "haar");
        assert_eq!(get_wavelet("DB4").unwrap().name(), "db4");
        assert_eq!(get_wavelet("bior1.3").unwrap().name(), "bior1_3");
        assert!(matches!(
            get_wavelet("nope"),
            Err(TransformError::UnknownWavelet { .. })
        ));
    }

    #[test]
    fn test_admissibility_sums() {
        for w in orthogonal_wavelets()
            .into_iter()
            .chain(biorthogonal_wavelets())
        {
            let h0_sum: f64 = w.h0().iter().sum();
            let h1_sum: f64 = w.h1().iter().sum();
            assert_relative_eq!(h0_sum, SQRT2, epsilon = 1e-12);
            assert_relative_eq!(h1_sum, 0.0, epsilon = 1e-12);

            let g0_sum: f64 = w.g0().iter().sum();
            assert_relative_eq!(g0_sum, SQRT2, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_orthogonal_unit_energy() {
        for w in orthogonal_wavelets() {
            let e0: f64 = w.h0().iter().map(|x| x * x).sum();
            let e1: f64 = w.h1().iter().map(|x| x * x).sum();
            assert_relative_eq!(e0, 1.0, epsilon = 1e-10);
            assert_relative_eq!(e1, 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_haar_qmf() {
        let w = get_wavelet("haar").unwrap();
        assert_relative_eq!(w.h1()[0], 1.0 / SQRT2, epsilon = 1e-15);
        assert_relative_eq!(w.h1()[1], -1.0 / SQRT2, epsilon = 1e-15);
    }

    #[test]
    fn test_biorthogonal_synthesis_product_is_pure_delay() {
        // Sum_k of the polynomial product G0*H0 + G1*H1 collapses to a
        // single coefficient 2 at index L-1 for the spline-1 family.
        for name in ["bior1_3", "bior1_5"] {
            let w = get_wavelet(name).unwrap();
            let l = w.filter_len();
            let mut product = vec![0.0; 2 * l - 1];
            for i in 0..l {
                for j in 0..l {
                    product[i + j] += w.g0()[i] * w.h0()[j] + w.g1()[i] * w.h1()[j];
                }
            }
            for (idx, &p) in product.iter().enumerate() {
                let expected = if idx == l - 1 { 2.0 } else { 0.0 };
                assert_relative_eq!(p, expected, epsilon = 1e-12);
            }
            assert_eq!(w.group_delay(), l - 1);
        }
    }

    #[test]
    fn test_continuous_rejected_from_modwt() {
        let w = get_wavelet("morlet").unwrap();
        assert_eq!(w.kind(), WaveletKind::Continuous);
        assert!(!w.supports_modwt());
        assert!(w.h0().is_empty());
    }

    #[test]
    fn test_enumeration_order_is_stable() {
        let names: Vec<_> = orthogonal_wavelets().iter().map(|w| w.name()).collect();
        assert_eq!(
            names,
            vec!["haar", "db2", "db3", "db4", "db6", "db8", "sym4", "sym8", "coif1", "coif2"]
        );
        let names: Vec<_> = biorthogonal_wavelets().iter().map(|w| w.name()).collect();
        assert_eq!(names, vec!["bior1_3", "bior1_5", "bior2_2"]);
    }
}
