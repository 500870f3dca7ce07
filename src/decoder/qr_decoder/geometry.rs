use crate::detector::FinderTriple;
use crate::detector::alignment::find_alignment_center;
use crate::models::{BitMatrix, Point, Version};
use crate::utils::geometry::PerspectiveTransform;

/// Outer symbol corners (TL, TR, BR, BL) for `triple` read as `version`.
///
/// Finder centres sit at module (3.5, 3.5) from their corner. The fourth
/// correspondence is the bottom-right alignment pattern when one is found,
/// otherwise the parallelogram completion of the three finders.
pub(super) fn symbol_corners(binary: &BitMatrix, triple: &FinderTriple, version: Version) -> Option<[Point; 4]> {
    let dim = version.size() as f64;
    let (tl, tr, bl) = (triple.top_left, triple.top_right, triple.bottom_left);
    let span = dim - 7.0;
    let ux = scale(tl.to(&tr), 1.0 / span);
    let uy = scale(tl.to(&bl), 1.0 / span);

    let parallelogram = (
        Point::new(dim - 3.5, dim - 3.5),
        Point::new(tr.x + bl.x - tl.x, tr.y + bl.y - tl.y),
    );
    let fourth = if version.number() >= 2 {
        let reach = dim - 10.0;
        let predicted = Point::new(
            tl.x + (ux.x + uy.x) * reach,
            tl.y + (ux.y + uy.y) * reach,
        );
        find_alignment_center(binary, predicted, ux, uy)
            .map(|found| (Point::new(dim - 6.5, dim - 6.5), found))
            .unwrap_or(parallelogram)
    } else {
        parallelogram
    };

    let modules = [
        Point::new(3.5, 3.5),
        Point::new(dim - 3.5, 3.5),
        Point::new(3.5, dim - 3.5),
        fourth.0,
    ];
    let image = [tl, tr, bl, fourth.1];
    let transform = PerspectiveTransform::from_points(&modules, &image)?;

    let corners = [
        transform.transform(&Point::new(0.0, 0.0)),
        transform.transform(&Point::new(dim, 0.0)),
        transform.transform(&Point::new(dim, dim)),
        transform.transform(&Point::new(0.0, dim)),
    ];
    corners.iter().all(Point::is_finite).then_some(corners)
}

fn scale(v: Point, factor: f64) -> Point {
    Point::new(v.x * factor, v.y * factor)
}
