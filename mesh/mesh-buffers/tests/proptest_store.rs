//! Property-based tests for the attribute buffer store.
//!
//! Run with: cargo test -p mesh-buffers -- proptest

use mesh_buffers::{
    AttributeBufferStore, AttributeKind, Point3, Vector2, Vector3, Vector4, Vertex,
};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn arb_f32() -> impl Strategy<Value = f32> {
    -100.0..100.0f32
}

/// Generate a vertex with every standard channel filled.
fn arb_vertex() -> impl Strategy<Value = Vertex> {
    (
        prop::array::uniform3(arb_f32()),
        prop::array::uniform3(arb_f32()),
        prop::array::uniform2(arb_f32()),
        prop::array::uniform4(0.0..1.0f32),
    )
        .prop_map(|(p, n, uv, c)| {
            Vertex::new(
                Point3::from(p),
                Vector3::from(n),
                Vector2::from(uv),
                Vector4::from(c),
            )
        })
}

/// Generate a vertex carrying an extra0 value.
fn arb_vertex_with_extra() -> impl Strategy<Value = Vertex> {
    (arb_vertex(), prop::array::uniform4(arb_f32()))
        .prop_map(|(v, e)| v.with_extra(0, Vector4::from(e)))
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn proptest_add_vertex_round_trips(vertices in prop::collection::vec(arb_vertex_with_extra(), 1..40)) {
        let mut store = AttributeBufferStore::with_material(false, &[0]);
        for v in &vertices {
            store.add_vertex(v).unwrap();
        }
        for (i, v) in vertices.iter().enumerate() {
            prop_assert_eq!(store.position(i).unwrap(), v.position);
            prop_assert_eq!(store.normal(i).unwrap(), v.normal);
            prop_assert_eq!(store.uv(i).unwrap(), v.uv);
            prop_assert_eq!(store.color(i).unwrap(), v.color);
            prop_assert_eq!(store.extra(i, 0).unwrap(), v.attributes.extras[0].unwrap());
        }
    }

    #[test]
    fn proptest_reserve_keeps_earlier_values(
        before in prop::collection::vec(arb_vertex(), 1..20),
        after in prop::collection::vec(arb_vertex(), 0..50),
    ) {
        let mut store = AttributeBufferStore::new();
        for v in &before {
            store.add_vertex(v).unwrap();
        }
        let snapshot: Vec<Vertex> = (0..before.len()).map(|i| store.vertex(i).unwrap()).collect();

        store.reserve(after.len());
        for v in &after {
            store.add_vertex(v).unwrap();
        }
        for (i, v) in snapshot.iter().enumerate() {
            prop_assert_eq!(&store.vertex(i).unwrap(), v);
        }
    }

    #[test]
    fn proptest_buffer_lengths_agree(vertices in prop::collection::vec(arb_vertex(), 0..30)) {
        let mut store = AttributeBufferStore::with_material(true, &[1, 4]);
        for v in &vertices {
            store.add_vertex_filled(v).unwrap();
        }
        for kind in store.attributes().kinds() {
            if kind != AttributeKind::Index {
                prop_assert_eq!(store.buffer_length(kind), vertices.len());
                prop_assert_eq!(store.buffer_size(kind), vertices.len() * kind.element_size());
            }
        }
    }

    #[test]
    fn proptest_out_of_range_triangles_rejected(n in 3usize..20, bad in 0u32..5) {
        let mut store = AttributeBufferStore::new();
        for k in 0..n {
            store.add_vertex(&Vertex::from_coords(k as f32, 0.0, 0.0)).unwrap();
        }
        let n32 = u32::try_from(n).unwrap();
        prop_assert!(store.add_triangle_indices([0, 1, n32 + bad], 0).is_err());
        prop_assert!(store.add_triangle_indices([0, 1, 2], n32 - 2).is_err());
        prop_assert_eq!(store.triangle_count(), 0);
    }
}
