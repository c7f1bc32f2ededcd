//! Fly-to annotations, their numbered screen labels and the part panels.
//!
//! Each annotation is a camera pose (position and look-at target) with a
//! title. Its label sits on the target point and is numbered from 1 in
//! definition order. Clicking a label flies the camera there and opens the
//! color panel of the part with the same title.

use cgmath::{Point3, Vector2};

use crate::{
    camera::{self, Camera, Projection},
    data_structures::material::Part,
};

/// Radius of a label's clickable disc in logical pixels.
pub const LABEL_RADIUS: f32 = 14.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub title: String,
    pub position: Point3<f32>,
    pub target: Point3<f32>,
}

impl Annotation {
    pub fn new(title: &str, position: [f32; 3], target: [f32; 3]) -> Self {
        Self {
            title: title.to_string(),
            position: position.into(),
            target: target.into(),
        }
    }

    /// The part whose panel this annotation opens, if any.
    pub fn part(&self) -> Option<Part> {
        self.title.parse().ok()
    }
}

pub fn default_annotations() -> Vec<Annotation> {
    vec![
        Annotation::new("Body", [-3.5, 6.0, 6.0], [0.0, 1.0, 0.0]),
        Annotation::new("Wheels", [2.6, 0.8, 2.6], [1.05, 0.7, 1.5]),
        Annotation::new("Glass", [0.0, 1.1, 2.0], [0.0, 0.9, 1.0]),
        Annotation::new("Spoiler", [0.0, 2.0, -4.0], [0.0, 0.9, -2.2]),
        Annotation::new("Interior", [0.0, 0.9, -0.1], [0.0, 0.75, 0.3]),
        Annotation::new("Brakes", [-2.6, 0.8, 1.3], [-1.0, 0.35, 1.45]),
    ]
}

/// Screen placement of one annotation label.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Label {
    /// 1-based, as printed on the badge.
    pub number: usize,
    /// Center in logical pixels, origin top-left.
    pub center: Vector2<f32>,
    /// NDC depth; smaller is closer.
    pub depth: f32,
    pub visible: bool,
}

/// Projects annotation targets to the screen and hit-tests clicks.
#[derive(Clone, Debug)]
pub struct LabelOverlay {
    width: f32,
    height: f32,
    labels: Vec<Label>,
}

impl LabelOverlay {
    pub fn new(count: usize, width: f32, height: f32) -> Self {
        let labels = (0..count)
            .map(|i| Label {
                number: i + 1,
                center: Vector2::new(0.0, 0.0),
                depth: 1.0,
                visible: false,
            })
            .collect();
        Self {
            width,
            height,
            labels,
        }
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Re-project every label for the current camera.
    pub fn update(&mut self, camera: &Camera, projection: &Projection, annotations: &[Annotation]) {
        for (label, annotation) in self.labels.iter_mut().zip(annotations) {
            match camera::project(camera, projection, annotation.target) {
                Some(ndc) if ndc.z >= 0.0 && ndc.z <= 1.0 => {
                    label.center = Vector2::new(
                        (ndc.x * 0.5 + 0.5) * self.width,
                        (0.5 - ndc.y * 0.5) * self.height,
                    );
                    label.depth = ndc.z;
                    label.visible = true;
                }
                _ => label.visible = false,
            }
        }
    }

    /// Index of the front-most visible label under `(x, y)`.
    pub fn hit_test(&self, x: f32, y: f32) -> Option<usize> {
        let point = Vector2::new(x, y);
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, label)| label.visible)
            .filter(|(_, label)| {
                let d = label.center - point;
                d.x * d.x + d.y * d.y <= LABEL_RADIUS * LABEL_RADIUS
            })
            .min_by(|(_, a), (_, b)| a.depth.total_cmp(&b.depth))
            .map(|(idx, _)| idx)
    }
}

/// Visibility of the reset button and of the per-part color panels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Panels {
    reset_visible: bool,
    visible: Option<Part>,
}

impl Default for Panels {
    fn default() -> Self {
        Self::new()
    }
}

impl Panels {
    /// All panels and the reset button start hidden.
    pub fn new() -> Self {
        Self {
            reset_visible: false,
            visible: None,
        }
    }

    pub fn reset_visible(&self) -> bool {
        self.reset_visible
    }

    /// The only panel that can be open at a time.
    pub fn visible_panel(&self) -> Option<Part> {
        self.visible
    }

    pub fn is_visible(&self, part: Part) -> bool {
        self.visible == Some(part)
    }

    pub fn on_label_clicked(&mut self, annotation: &Annotation) {
        self.reset_visible = true;
        self.visible = annotation.part();
    }

    pub fn on_reset_clicked(&mut self) {
        self.reset_visible = false;
        self.visible = None;
    }
}
