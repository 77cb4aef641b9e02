use serde::Serialize;

/// Ordered, de-duplicated numeric tokens as they appear in the source text.
pub type NumberList = Vec<String>;

/// Output of the AI-likelihood detector. The two probabilities always sum
/// to one; `human_probability` is derived from `ai_probability`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreResult {
    pub ai_probability: f64,
    pub human_probability: f64,
}

impl ScoreResult {
    pub fn from_ai_probability(ai_probability: f64) -> Self {
        let ai = if ai_probability.is_nan() {
            0.0
        } else {
            ai_probability.clamp(0.0, 1.0)
        };
        Self {
            ai_probability: ai,
            human_probability: 1.0 - ai,
        }
    }

    /// Softmax over a two-class logit vector, picking the class at
    /// `ai_index` as the "generated" class.
    pub fn from_logits(logits: &[f32], ai_index: usize) -> Option<Self> {
        if logits.len() != 2 || ai_index > 1 {
            return None;
        }
        let probs = softmax(logits);
        Some(Self::from_ai_probability(probs[ai_index]))
    }

    pub fn band(&self) -> RiskBand {
        RiskBand::from_score(self.ai_probability)
    }

    /// `0.1234` renders as `"12.34 %"`.
    pub fn ai_percentage(&self) -> String {
        format!("{:.2} %", self.ai_probability * 100.0)
    }
}

pub fn softmax(logits: &[f32]) -> Vec<f64> {
    let max = logits
        .iter()
        .copied()
        .fold(f32::NEG_INFINITY, f32::max) as f64;
    let exps: Vec<f64> = logits.iter().map(|&l| (l as f64 - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Named risk tier for an AI probability. Each band includes its lower
/// bound: 0.80 is `VeryHigh`, 0.50 is `High`, 0.15 is `Moderate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskBand {
    VeryHigh,
    High,
    Moderate,
    Low,
}

impl RiskBand {
    pub const VERY_HIGH_THRESHOLD: f64 = 0.80;
    pub const HIGH_THRESHOLD: f64 = 0.50;
    pub const MODERATE_THRESHOLD: f64 = 0.15;

    pub fn from_score(ai_probability: f64) -> Self {
        if ai_probability >= Self::VERY_HIGH_THRESHOLD {
            RiskBand::VeryHigh
        } else if ai_probability >= Self::HIGH_THRESHOLD {
            RiskBand::High
        } else if ai_probability >= Self::MODERATE_THRESHOLD {
            RiskBand::Moderate
        } else {
            RiskBand::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskBand::VeryHigh => "Very High",
            RiskBand::High => "High",
            RiskBand::Moderate => "Moderate",
            RiskBand::Low => "Low",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RiskBand::VeryHigh => "Very likely generated by an AI (>= 80%)",
            RiskBand::High => "Probably generated by an AI (50-80%)",
            RiskBand::Moderate => "May contain AI-generated passages (15-50%)",
            RiskBand::Low => "Very likely written by a human (< 15%)",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            RiskBand::VeryHigh => "#d62728",
            RiskBand::High => "#e6b800",
            RiskBand::Moderate => "#1f77b4",
            RiskBand::Low => "#2ca02c",
        }
    }
}

/// Text and metadata pulled out of one uploaded PDF.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub text: String,
    pub pages: usize,
    pub title: Option<String>,
    pub author: Option<String>,
    pub file_size_bytes: usize,
    /// True when extraction stopped at the character cap.
    pub truncated: bool,
}

impl ExtractedDocument {
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Everything one pipeline run produces, before presentation.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub document: ExtractedDocument,
    pub score: ScoreResult,
    pub summary: String,
    pub numbers: NumberList,
}
