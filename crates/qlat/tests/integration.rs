//! Integration tests across lattice, bonds, field and operator assembly.

use approx::assert_relative_eq;
use qlat::{
    build_operator, tight_binding_hamiltonian, AdaptBonds, AdjacencyMatrix, Boundary,
    BoundaryConditions, Bonds, BondsExt, CMatrix, Complex64, DVec, DirectedFn, Hopping, Lattice,
    LatticeValue, NoField, OperatorBasis, OperatorBuilder, OperatorError, PointFlux, Site,
    SiteDistance, SymmetricGauge, Term, TightBindingParams, Translation,
};
use std::sync::Arc;

fn v(xs: &[f64]) -> DVec {
    DVec::from_column_slice(xs)
}

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

/// Four sites at (1,1), (1,2), (2,1), (2,2) without Bravais structure.
fn plaquette() -> Arc<Lattice> {
    let sites = [[1.0, 1.0], [1.0, 2.0], [2.0, 1.0], [2.0, 2.0]]
        .iter()
        .map(|p| Site::from_slice(p))
        .collect();
    Arc::new(Lattice::from_sites(sites).unwrap())
}

#[test]
fn adjacency_on_two_by_two_square() {
    let lat = Arc::new(Lattice::square(2, 2));
    let mut adj = AdjacencyMatrix::new(lat.clone());
    adj.set_index(0, 1, true);
    adj.set_index(1, 3, true);
    adj.set_index(2, 3, true);

    let dense = adj.to_dense();
    assert_eq!(dense.shape(), (4, 4));
    assert_eq!(dense.iter().filter(|&&b| b).count(), 6);
    assert_eq!(dense, dense.transpose());
    for i in 0..4 {
        assert!(!dense[(i, i)]);
    }

    let pairs: Vec<_> = adj.pairs().unwrap().map(|(a, b)| (a.index, b.index)).collect();
    assert_eq!(pairs, vec![(0, 1), (1, 3), (2, 3)]);
}

#[test]
fn translation_leaves_generic_lattice() {
    let lat = plaquette();
    let t = Translation::new(lat.clone(), v(&[1.0, 0.0])).unwrap();
    let start = Site::from_slice(&[1.0, 1.0]);

    let once = (&start + &t).unwrap().unwrap();
    assert_eq!(once, Site::from_slice(&[2.0, 1.0]));
    assert_eq!(lat.site_index(&once), Some(2));
    assert_eq!(&once + &t, Ok(None));
}

#[test]
fn two_site_chain_hamiltonian() {
    let (zero, one) = (c(0.0, 0.0), c(1.0, 0.0));
    let expected = CMatrix::from_row_slice(2, 2, &[zero, one, one, zero]);
    let lat = Arc::new(Lattice::chain(2));

    let params = TightBindingParams::default();
    let h = tight_binding_hamiltonian(lat.clone(), &params, NoField).unwrap();
    assert_eq!(h.to_dense(), expected);
    assert!(h.is_hermitian(1e-12));

    // Same result from an explicit pair term.
    let terms = vec![Term::Hopping(Hopping::pairs(
        CMatrix::identity(1, 1),
        SiteDistance::nearest(lat.clone(), 1),
    ))];
    let basis = OperatorBasis::scalar(lat);
    let h2 = build_operator(basis, &terms, NoField, BoundaryConditions::open()).unwrap();
    assert_eq!(h2.matrix, h.matrix);
}

#[test]
fn adjacency_from_translations_matches_hamiltonian_sparsity() {
    let lat = Arc::new(Lattice::square(3, 4));
    let tx = Translation::new(lat.clone(), v(&[1.0, 0.0])).unwrap();
    let ty = Translation::new(lat.clone(), v(&[0.0, 1.0])).unwrap();
    let adj = AdjacencyMatrix::from_bonds(&[&tx, &ty]).unwrap();

    let params = TightBindingParams::default();
    let h = tight_binding_hamiltonian(lat.clone(), &params, SymmetricGauge { b: 0.3 }).unwrap();
    assert_eq!(h.matrix.nnz(), adj.nnz());
    for (a, b) in adj.pairs().unwrap() {
        assert_relative_eq!(h.matrix.get(a.index, b.index).norm(), 1.0, epsilon = 1e-12);
    }
}

#[test]
fn periodic_flux_lattice_is_hermitian() {
    let lat = Arc::new(Lattice::square(4, 4));
    let params = TightBindingParams {
        t2: 0.3,
        boundaries: BoundaryConditions::new(vec![Boundary::Periodic, Boundary::Twisted(1.1)]),
        ..Default::default()
    };
    let h = tight_binding_hamiltonian(lat, &params, PointFlux::new(0.25, [1.5, 1.5])).unwrap();
    assert!(h.is_hermitian(1e-10));
    // Every site has four nearest and four diagonal neighbors on the torus.
    assert_eq!(h.matrix.nnz(), 16 * 8);
}

#[test]
fn point_flux_on_a_site_aborts() {
    let lat = Arc::new(Lattice::square(3, 3));
    let params = TightBindingParams::default();
    let err = tight_binding_hamiltonian(lat, &params, PointFlux::new(0.5, [1.0, 1.0])).unwrap_err();
    assert!(matches!(err, OperatorError::NonFinitePhase { .. }));
}

#[test]
fn selector_restricts_hoppings_to_a_region() {
    let lat = Arc::new(Lattice::chain(6));
    let left = AdjacencyMatrix::from_fn(lat.clone(), |a, b| a.coords[0] < 3.0 && b.coords[0] < 3.0);
    let hop = Hopping::offset(CMatrix::identity(1, 1), v(&[1.0])).with_selector(left);
    let h = build_operator(
        OperatorBasis::scalar(lat),
        &[Term::Hopping(hop)],
        NoField,
        BoundaryConditions::periodic(1),
    )
    .unwrap();
    // Bonds 0-1 and 1-2 survive; the wrap-around 5-0 does not.
    assert_eq!(h.matrix.nnz(), 4);
    assert_eq!(h.matrix.get(5, 0), c(0.0, 0.0));
}

#[test]
fn directed_bonds_drive_hoppings() {
    let lat = Arc::new(Lattice::chain(5));
    let skip = DirectedFn::new(lat.clone(), |s: &Site| {
        vec![Site::from_slice(&[s.coords[0] + 2.0])]
    });
    let mut b = OperatorBuilder::new(OperatorBasis::scalar(lat));
    b.add_scalar_hoppings(c(0.0, 1.0), &skip).unwrap();
    let h = b.build();
    assert_eq!(h.matrix.get(0, 2), c(0.0, 1.0));
    assert_eq!(h.matrix.get(2, 0), c(0.0, -1.0));
    assert_eq!(h.matrix.nnz(), 6);
    assert!(h.is_hermitian(1e-12));
}

#[test]
fn potential_and_onsite_terms() {
    let lat = Arc::new(Lattice::square(2, 2));
    let sz = CMatrix::from_row_slice(2, 2, &[c(1.0, 0.0), c(0.0, 0.0), c(0.0, 0.0), c(-1.0, 0.0)]);
    let profile = LatticeValue::from_fn(lat.clone(), |s| s.coords[0] + s.coords[1]);
    let terms = vec![
        Term::OnSite(CMatrix::from_element(1, 1, c(0.5, 0.0))),
        Term::Potential(sz.clone(), profile),
    ];
    let basis = OperatorBasis::new(lat, 2);
    let h = build_operator(basis, &terms, NoField, BoundaryConditions::open()).unwrap();
    // Site (1,1) is index 3 with profile value 2.
    let block = h.site_block(3, 3);
    assert_eq!(block[(0, 0)], c(2.5, 0.0));
    assert_eq!(block[(1, 1)], c(-1.5, 0.0));
    assert_eq!(h.matrix.nnz(), 8);
}

#[test]
fn lattice_plus_translation_builds_shifted_copy() {
    let lat = Lattice::chain(3);
    let t = Translation::unbound(v(&[3.0]));
    let copy = (&lat + &t).unwrap();
    assert_eq!(copy.site(0).unwrap().coords[0], 3.0);
    assert_eq!(copy.len(), 3);
    assert!(copy.site_index(&Site::from_slice(&[0.0])).is_none());
}

#[test]
fn adapted_bonds_follow_a_larger_sample() {
    let small = Arc::new(Lattice::chain(3));
    let big = Arc::new(Lattice::chain(6));
    let nn = SiteDistance::nearest(small, 1).adapt_bonds(&big).unwrap();
    assert!(Arc::ptr_eq(nn.lattice().unwrap(), &big));
    assert_eq!(nn.pairs().unwrap().count(), 5);
}
