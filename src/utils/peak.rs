use crate::float::Float;

struct Point<T>

where

    T: Float,

{
    x: T,
    y: T,
}

/// Refine the integer extremum at `idx` of `data` to a sub-sample position by fitting
/// a parabola through `idx - 1`, `idx` and `idx + 1`.
///
/// Works for minima (YIN) and maxima (autocorrelation) alike. The index is returned
/// unrefined when it sits on either end of `data` or when the three points are
/// collinear.
pub fn parabolic_refine<T: Float>(data: &[T], idx: usize) -> T {
    let unrefined = T::from_index(idx);
    if idx == 0 || idx + 1 >= data.len() {
        return unrefined;
    }

    quadratic_interpolation(
        Point {
            x: T::from_index(idx - 1),
            y: data[idx - 1],
        },
        Point {
            x: unrefined,
            y: data[idx],
        },
        Point {
            x: T::from_index(idx + 1),
            y: data[idx + 1],
        },
    )
    .map(|vertex| vertex.x)
    .unwrap_or(unrefined)
}

/// Vertex of the parabola through three equally spaced points, or `None` if the
/// points are collinear.
fn quadratic_interpolation<T: Float>(
    left: Point<T>,
    center: Point<T>,
    right: Point<T>,
) -> Option<Point<T>> {
    let curvature = T::lit(2.0) * center.y - left.y - right.y;
    if curvature == T::zero() {
        return None;
    }
    let shift = T::lit(0.5) * (right.y - left.y) / curvature;
    let x = center.x + shift;
    let y = center.y + T::lit(0.25) * (right.y - left.y) * shift;
    if x.is_finite() {
        Some(Point { x, y })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peak_correction() {
        let point = quadratic_interpolation(
            Point {
                x: -1.5,
                y: -(1.5 * 1.5) + 4.0,
            },
            Point {
                x: -0.5,
                y: -(0.5 * 0.5) + 4.0,
            },
            Point {
                x: 0.5,
                y: -(0.5 * 0.5) + 4.0,
            },
        )
        .unwrap();
        assert_eq!(point.x, 0.0);
        assert_eq!(point.y, 4.0);
    }

    #[test]
    fn refines_minimum_of_sampled_parabola() {
        // (x - 3.25)^2 sampled at integers; the vertex lies between 3 and 4.
        let data: Vec<f64> = (0..8).map(|x| (x as f64 - 3.25).powi(2)).collect();
        let refined = parabolic_refine(&data, 3);
        assert!((refined - 3.25).abs() < 1e-12);
    }

    #[test]
    fn degenerate_and_edge_indices_are_unrefined() {
        let flat = [1.0f32, 1.0, 1.0, 1.0];
        assert_eq!(parabolic_refine(&flat, 2), 2.0);

        let line = [0.0f64, 1.0, 2.0, 3.0];
        assert_eq!(parabolic_refine(&line, 1), 1.0);

        let data = [3.0f64, 1.0, 2.0];
        assert_eq!(parabolic_refine(&data, 0), 0.0);
        assert_eq!(parabolic_refine(&data, 2), 2.0);
    }
}
