use glam::Vec3;

use crate::renderer::Vertex;
use crate::scene::Geometry;

/// Unit cube centred on the origin, 36 vertices, flat normals.
pub fn cube() -> Geometry {
    let faces = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];

    let mut vertices = Vec::with_capacity(36);
    for (normal, u, v) in faces {
        let center = normal * 0.5;
        let corner = |su: f32, sv: f32| center + (u * su + v * sv) * 0.5;
        let (a, b, c, d) = (
            corner(-1.0, -1.0),
            corner(1.0, -1.0),
            corner(1.0, 1.0),
            corner(-1.0, 1.0),
        );
        push_outward(&mut vertices, a, b, c);
        push_outward(&mut vertices, a, c, d);
    }
    Geometry::new(vertices)
}

/// Triangular prism with its cross-section in the XY plane, 24 vertices.
pub fn triangle_prism() -> Geometry {
    let profile = [
        Vec3::new(-0.5, -0.5, 0.0),
        Vec3::new(0.5, -0.5, 0.0),
        Vec3::new(0.0, 0.5, 0.0),
    ];
    let front = profile.map(|p| p + Vec3::new(0.0, 0.0, -0.5));
    let back = profile.map(|p| p + Vec3::new(0.0, 0.0, 0.5));

    let mut vertices = Vec::with_capacity(24);
    push_outward(&mut vertices, front[0], front[1], front[2]);
    push_outward(&mut vertices, back[0], back[1], back[2]);
    for i in 0..3 {
        let j = (i + 1) % 3;
        push_outward(&mut vertices, front[i], front[j], back[j]);
        push_outward(&mut vertices, front[i], back[j], back[i]);
    }
    Geometry::new(vertices)
}

// Emits a counter-clockwise triangle as seen from outside a convex solid that
// contains the origin.
fn push_outward(out: &mut Vec<Vertex>, a: Vec3, b: Vec3, c: Vec3) {
    let mut normal = (b - a).cross(c - a).normalize();
    let (b, c) = if normal.dot(a + b + c) < 0.0 {
        normal = -normal;
        (c, b)
    } else {
        (b, c)
    };

    for position in [a, b, c] {
        out.push(Vertex {
            position: position.to_array(),
            normal: normal.to_array(),
        });
    }
}
