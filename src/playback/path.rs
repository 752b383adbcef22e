use crate::core::{Coordinate, PlaybackError, PlaybackResult, RoutePoint};
use crate::geo::{LonLat, Projection};

/// Builds curves with a fixed projection
#[derive(Debug, Clone, Default)]
pub struct PathBuilder<P = LonLat> {
    projection: P,
}

impl<P: Projection> PathBuilder<P> {
    pub fn new(projection: P) -> Self {
        Self { projection }
    }

    pub fn build(&self, route: &[RoutePoint]) -> PlaybackResult<Curve> {
        Curve::build(route, &self.projection)
    }

    pub fn projection(&self) -> &P {
        &self.projection
    }
}

/// A route projected into planar space, with cumulative arc lengths
///
/// `cumulative[i]` is the distance travelled along the polyline from the first
/// point to point `i`, so the table starts at 0 and ends at `total_length`.
#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    points: Vec<Coordinate>,
    cumulative: Vec<f64>,
    total_length: f64,
}

impl Curve {
    /// Project every point and accumulate segment lengths
    ///
    /// All-or-nothing: the first projection failure aborts the build.
    pub fn build<P: Projection + ?Sized>(
        route: &[RoutePoint],
        projection: &P,
    ) -> PlaybackResult<Self> {
        if route.is_empty() {
            return Err(PlaybackError::EmptyRoute);
        }

        let points = route
            .iter()
            .map(|p| projection.project(p))
            .collect::<Result<Vec<_>, _>>()?;

        let mut cumulative = Vec::with_capacity(points.len());
        let mut total_length = 0.0;
        cumulative.push(0.0);
        for pair in points.windows(2) {
            total_length += pair[0].dist_to(pair[1]);
            cumulative.push(total_length);
        }

        Ok(Self {
            points,
            cumulative,
            total_length,
        })
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn cumulative_lengths(&self) -> &[f64] {
        &self.cumulative
    }

    pub fn total_length(&self) -> f64 {
        self.total_length
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when the curve holds no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Zero length: a single point, or every point identical
    pub fn is_degenerate(&self) -> bool {
        self.total_length <= 0.0
    }

    /// Start and end marker positions
    pub fn endpoints(&self) -> (Coordinate, Coordinate) {
        // build() guarantees at least one point
        (self.points[0], self.points[self.points.len() - 1])
    }

    /// Axis-aligned extent as (min, max), for fitting a view to the route
    pub fn bounds(&self) -> (Coordinate, Coordinate) {
        let (first, _) = self.endpoints();
        self.points.iter().fold((first, first), |(min, max), p| {
            (
                Coordinate::new(min.x.min(p.x), min.y.min(p.y)),
                Coordinate::new(max.x.max(p.x), max.y.max(p.y)),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::ProjectionError;

    #[test]
    fn test_cumulative_table_matches_point_count() {
        let route = vec![
            RoutePoint::new(0.0, 0.0),
            RoutePoint::new(0.0, 3.0),
            RoutePoint::new(4.0, 3.0),
            RoutePoint::new(4.0, 3.0),
            RoutePoint::new(0.0, 0.0),
        ];
        let curve = Curve::build(&route, &LonLat).unwrap();

        assert_eq!(curve.cumulative_lengths().len(), route.len());
        assert_eq!(curve.cumulative_lengths(), &[0.0, 3.0, 7.0, 7.0, 12.0]);
        assert!(curve
            .cumulative_lengths()
            .windows(2)
            .all(|w| w[0] <= w[1]));
        assert_eq!(curve.total_length(), 12.0);
    }

    #[test]
    fn test_single_point_is_degenerate() {
        let curve = Curve::build(&[RoutePoint::new(23.0225, 72.5714)], &LonLat).unwrap();
        assert_eq!(curve.len(), 1);
        assert_eq!(curve.total_length(), 0.0);
        assert!(curve.is_degenerate());
        assert_eq!(curve.cumulative_lengths(), &[0.0]);
    }

    #[test]
    fn test_empty_route_rejected() {
        assert!(matches!(
            Curve::build(&[], &LonLat),
            Err(PlaybackError::EmptyRoute)
        ));
    }

    #[test]
    fn test_projection_error_propagates_unchanged() {
        let route = vec![RoutePoint::new(10.0, 10.0), RoutePoint::new(10.0, 500.0)];
        match Curve::build(&route, &LonLat) {
            Err(PlaybackError::Projection(ProjectionError::OutOfRange { longitude, .. })) => {
                assert_eq!(longitude, 500.0)
            }
            other => panic!("expected projection error, got {:?}", other),
        }
    }

    #[test]
    fn test_bounds_and_endpoints() {
        let route = vec![
            RoutePoint::new(19.0760, 72.8777),
            RoutePoint::new(18.5204, 73.8567),
            RoutePoint::new(17.3850, 78.4867),
        ];
        let curve = Curve::build(&route, &LonLat).unwrap();
        let (start, end) = curve.endpoints();
        assert_eq!(start, Coordinate::new(72.8777, 19.0760));
        assert_eq!(end, Coordinate::new(78.4867, 17.3850));

        let (min, max) = curve.bounds();
        assert_eq!(min, Coordinate::new(72.8777, 17.3850));
        assert_eq!(max, Coordinate::new(78.4867, 19.0760));
    }
}
