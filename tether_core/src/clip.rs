// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Clip composition.
//!
//! A text element lists the frames it is clipped by, outermost first. Each
//! frame contributes its rectangle `(0, 0, w, h)` mapped by its surface-space
//! transform, which is a convex quadrilateral (possibly rotated or skewed).
//! [`ClipComposer::compose`] intersects those quads in list order and yields a
//! [`ClipRegion`]:
//!
//! - no clip ids (or none resolvable) → unclipped;
//! - an empty intersection → fully clipped;
//! - otherwise a convex polygon in surface coordinates, counter-clockwise.
//!
//! The per-frame quads are kept in [`ClipRegion::layers`] for hosts that stack
//! one mask per frame instead of using the intersected polygon.
//!
//! Frames missing from the table are recorded in [`ClipRegion::skipped`] and
//! otherwise ignored.

use kurbo::{BezPath, Point, Rect, Vec2};

use crate::element::FrameElement;
use crate::id::IdChain;
use crate::tables::ElementTable;

/// Area below which a polygon counts as empty.
const AREA_EPSILON: f64 = 1e-9;

/// Distance below which two vertices are merged.
const VERTEX_EPSILON: f64 = 1e-9;

/// One frame's contribution to a clip.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipLayer {
    /// Frame identity.
    pub id_chain: IdChain,
    /// The frame rectangle in surface coordinates, counter-clockwise.
    pub quad: [Point; 4],
}

/// The composed clip of one element.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClipRegion {
    polygon: Option<Vec<Point>>,
    /// Resolved frames, outermost first.
    pub layers: Vec<ClipLayer>,
    /// Clip ids with no frame in the table.
    pub skipped: Vec<IdChain>,
}

impl ClipRegion {
    /// A region that clips nothing.
    #[must_use]
    pub fn unclipped() -> Self {
        Self::default()
    }

    /// Returns `true` if no frame constrains the element.
    #[must_use]
    pub fn is_unclipped(&self) -> bool {
        self.polygon.is_none()
    }

    /// Returns `true` if the element is clipped away entirely.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.polygon.as_ref().is_some_and(|p| p.len() < 3)
    }

    /// Returns the intersected polygon, or `None` when unclipped.
    #[must_use]
    pub fn polygon(&self) -> Option<&[Point]> {
        self.polygon.as_deref()
    }

    /// Returns the axis-aligned bounds of the clip.
    ///
    /// `None` when unclipped; a zero rect when fully clipped.
    #[must_use]
    pub fn bounding_box(&self) -> Option<Rect> {
        let polygon = self.polygon.as_ref()?;
        let mut points = polygon.iter();
        let Some(first) = points.next() else {
            return Some(Rect::ZERO);
        };
        Some(points.fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p)))
    }

    /// Returns the clip as a closed path, or `None` when unclipped.
    #[must_use]
    pub fn to_bez_path(&self) -> Option<BezPath> {
        let polygon = self.polygon.as_ref()?;
        let mut path = BezPath::new();
        let mut points = polygon.iter();
        if let Some(first) = points.next() {
            path.move_to(*first);
            for p in points {
                path.line_to(*p);
            }
            path.close_path();
        }
        Some(path)
    }

    /// Returns `true` if `point` survives the clip.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        match &self.polygon {
            None => true,
            Some(polygon) if polygon.len() < 3 => false,
            Some(polygon) => edges(polygon).all(|(a, b)| cross(b - a, point - a) >= 0.0),
        }
    }
}

/// Composes clip regions against a frame table.
#[derive(Clone, Copy, Debug)]
pub struct ClipComposer<'a> {
    frames: &'a ElementTable<FrameElement>,
}

impl<'a> ClipComposer<'a> {
    /// Creates a composer reading `frames`.
    #[must_use]
    pub fn new(frames: &'a ElementTable<FrameElement>) -> Self {
        Self { frames }
    }

    /// Intersects the frames named by `clip_ids`, outermost first.
    #[must_use]
    pub fn compose(&self, clip_ids: &[IdChain]) -> ClipRegion {
        let mut region = ClipRegion::unclipped();
        for id in clip_ids {
            let Some(frame) = self.frames.get(id) else {
                region.skipped.push(id.clone());
                continue;
            };
            let quad = frame_quad(frame);
            region.layers.push(ClipLayer {
                id_chain: id.clone(),
                quad,
            });

            if signed_area(&quad).abs() <= AREA_EPSILON {
                region.polygon = Some(Vec::new());
                continue;
            }
            region.polygon = Some(match region.polygon.take() {
                None => quad.to_vec(),
                Some(subject) => clip_convex(&subject, &quad),
            });
        }
        region
    }
}

/// Maps the frame rectangle to surface space, counter-clockwise.
fn frame_quad(frame: &FrameElement) -> [Point; 4] {
    let r = frame.local_bounds();
    let t = frame.transform;
    let mut quad = [
        t * Point::new(r.x0, r.y0),
        t * Point::new(r.x1, r.y0),
        t * Point::new(r.x1, r.y1),
        t * Point::new(r.x0, r.y1),
    ];
    if signed_area(&quad) < 0.0 {
        quad.reverse();
    }
    quad
}

/// Clips a convex `subject` against a counter-clockwise convex `clip`
/// (Sutherland–Hodgman).
fn clip_convex(subject: &[Point], clip: &[Point]) -> Vec<Point> {
    let mut output = subject.to_vec();
    for (a, b) in edges(clip) {
        if output.is_empty() {
            break;
        }
        let edge = b - a;
        let input = core::mem::take(&mut output);
        for (p, q) in edges(&input) {
            let dp = cross(edge, p - a);
            let dq = cross(edge, q - a);
            if dp >= 0.0 {
                push_vertex(&mut output, p);
            }
            if (dp >= 0.0) != (dq >= 0.0) {
                let t = dp / (dp - dq);
                push_vertex(&mut output, p.lerp(q, t));
            }
        }
        if output.len() > 1 && output[0].distance(output[output.len() - 1]) <= VERTEX_EPSILON {
            output.pop();
        }
    }
    if output.len() < 3 || signed_area(&output) <= AREA_EPSILON {
        output.clear();
    }
    output
}

fn push_vertex(out: &mut Vec<Point>, p: Point) {
    if out.last().is_none_or(|last| last.distance(p) > VERTEX_EPSILON) {
        out.push(p);
    }
}

/// Iterates over the closed polygon's edges.
fn edges(polygon: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    let next = polygon.iter().cycle().skip(1);
    polygon.iter().copied().zip(next.copied())
}

fn cross(u: Vec2, v: Vec2) -> f64 {
    u.x * v.y - u.y * v.x
}

/// Shoelace area; positive for counter-clockwise in a y-up frame.
fn signed_area(polygon: &[Point]) -> f64 {
    edges(polygon)
        .map(|(p, q)| p.x * q.y - q.x * p.y)
        .sum::<f64>()
        * 0.5
}
