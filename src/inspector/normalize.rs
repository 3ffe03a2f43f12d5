use serde::{Deserialize, Serialize};

/// Numeric bounds enforced by number editors and number properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumberBounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
    /// Discrete marks. When present they win over `step`.
    pub marks: Vec<f64>,
    /// Without `force` values pass through untouched.
    pub force: bool,
}

impl Default for NumberBounds {
    fn default() -> Self {
        Self {
            min: None,
            max: None,
            step: None,
            marks: Vec::new(),
            force: false,
        }
    }
}

impl NumberBounds {
    pub fn new(min: f64, max: f64) -> Self {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min: Some(min),
            max: Some(max),
            ..Self::default()
        }
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = (step.is_finite() && step > 0.0).then_some(step);
        self
    }

    pub fn with_marks(mut self, marks: Vec<f64>) -> Self {
        self.marks = marks.into_iter().filter(|mark| mark.is_finite()).collect();
        self
    }

    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }

    /// Clamp, snap to the nearest step multiple measured from `min`, then
    /// snap that to the nearest in-bounds mark. A value already sitting on
    /// an in-bounds mark is kept, which makes the pipeline idempotent.
    pub fn apply(&self, value: f64) -> f64 {
        if !self.force || !value.is_finite() {
            return value;
        }
        let clamped = self.clamp(value);
        if self.is_mark(clamped) {
            return clamped;
        }
        let stepped = self.snap_to_step(clamped);
        self.nearest_mark(stepped).unwrap_or(stepped)
    }

    pub fn clamp(&self, value: f64) -> f64 {
        let mut out = value;
        if let Some(min) = self.min {
            out = out.max(min);
        }
        if let Some(max) = self.max {
            out = out.min(max);
        }
        out
    }

    /// Slider position in `[0, 1]`, or `None` without a finite range.
    pub fn ratio(&self, value: f64) -> Option<f64> {
        let (min, max) = (self.min?, self.max?);
        if max <= min {
            return Some(0.0);
        }
        Some(((value - min) / (max - min)).clamp(0.0, 1.0))
    }

    fn is_mark(&self, value: f64) -> bool {
        self.marks.iter().any(|mark| *mark == value && self.clamp(*mark) == *mark)
    }

    fn nearest_mark(&self, value: f64) -> Option<f64> {
        self.marks
            .iter()
            .copied()
            .filter(|mark| self.clamp(*mark) == *mark)
            .fold(None, |best: Option<f64>, mark| match best {
                Some(current)
                    if (current - value).abs() < (mark - value).abs()
                        || ((current - value).abs() == (mark - value).abs() && current <= mark) =>
                {
                    Some(current)
                }
                _ => Some(mark),
            })
    }

    fn snap_to_step(&self, value: f64) -> f64 {
        let Some(step) = self.step else {
            return value;
        };
        let origin = self.min.unwrap_or(0.0);
        let mut multiple = ((value - origin) / step).round();
        let mut snapped = origin + multiple * step;
        if let Some(max) = self.max
            && snapped > max
        {
            multiple -= 1.0;
            snapped = origin + multiple * step;
        }
        if let Some(min) = self.min
            && snapped < min
        {
            snapped = min;
        }
        snapped
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Casing {
    #[default]
    None,
    Upper,
    Lower,
}

/// Text normalization applied on commit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextRules {
    pub casing: Casing,
    pub trim: bool,
    pub max_chars: Option<usize>,
}

impl TextRules {
    pub fn apply(&self, text: &str) -> String {
        let mut out = if self.trim {
            text.trim().to_string()
        } else {
            text.to_string()
        };
        out = match self.casing {
            Casing::None => out,
            Casing::Upper => out.to_uppercase(),
            Casing::Lower => out.to_lowercase(),
        };
        if let Some(limit) = self.max_chars {
            out = truncate_chars(&out, limit);
        }
        out
    }
}

pub fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}
