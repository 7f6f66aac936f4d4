// Resolution of one overlapping pair of circles.
//
// Velocity: an impulse along the contact normal, only while the pair is closing.
// Position: the overlap is removed immediately, split by inverse mass, even
// when the pair is at rest. A dragged node has zero inverse mass, so its
// partner takes the whole correction. So does the partner of a node already
// pressed against the wall the correction would push it into.

use super::{Body, Boundary, V2};

/// Contact normal used when two centres coincide.
const FALLBACK_NORMAL: (f64, f64) = (1.0, 0.0);

/// Overlap below this is treated as touching.
pub const CONTACT_SLOP: f64 = 1e-9;

/// Whether two circles overlap by more than [`CONTACT_SLOP`].
pub fn overlaps(a: &Body, b: &Body) -> bool {
    a.radius + b.radius - (b.position - a.position).norm() > CONTACT_SLOP
}

/// Share of the positional correction `body` can take when pushed along `dir`.
fn correction_weight(body: &Body, dir: &V2, boundary: &Boundary) -> f64 {
    if body.dragged {
        return 0.0;
    }
    let (x0, x1) = boundary.x_range(body.radius);
    let (y0, y1) = boundary.y_range(body.radius);
    let p = &body.position;
    let pinned = (dir.x < 0.0 && p.x <= x0)
        || (dir.x > 0.0 && p.x >= x1)
        || (dir.y < 0.0 && p.y <= y0)
        || (dir.y > 0.0 && p.y >= y1);
    if pinned { 0.0 } else { 1.0 }
}

/// Resolve overlap between `a` and `b`. Returns whether they overlapped.
///
/// The normal points from `a` to `b`; with coincident centres `a` is pushed
/// toward -x and `b` toward +x.
///
/// The impulse `-(1 + e)·vn` is divided by the summed inverse masses rather
/// than applied in full to each node, so a free pair shares it and the
/// relative speed after contact is exactly `e` times the closing speed.
pub fn resolve_pair(
    a: &mut Body,
    b: &mut Body,
    boundary: &Boundary,
    restitution: f64,
    apply_impulse: bool,
) -> bool {
    let wa = a.inverse_mass();
    let wb = b.inverse_mass();
    let w = wa + wb;
    if w == 0.0 || !overlaps(a, b) {
        return false;
    }

    let delta = b.position - a.position;
    let distance = delta.norm();
    let normal = if distance > 0.0 {
        delta / distance
    } else {
        V2::new(FALLBACK_NORMAL.0, FALLBACK_NORMAL.1)
    };

    if apply_impulse {
        let normal_velocity = (b.velocity - a.velocity).dot(&normal);
        if normal_velocity < 0.0 {
            let impulse = -(1.0 + restitution) * normal_velocity / w;
            a.velocity -= normal * (impulse * wa);
            b.velocity += normal * (impulse * wb);
        }
    }

    let mut ca = correction_weight(a, &-normal, boundary);
    let mut cb = correction_weight(b, &normal, boundary);
    if ca + cb == 0.0 {
        // Nothing can give way; split by inverse mass and let containment settle it.
        (ca, cb) = (wa, wb);
    }
    let overlap = a.radius + b.radius - distance;
    a.position -= normal * (overlap * ca / (ca + cb));
    b.position += normal * (overlap * cb / (ca + cb));
    true
}
