//! Phrase library (C9, spec.md §4.9).
//!
//! Canonical phrases keyed by atom name, at three intensity levels, plus
//! the role words used to compose a fusion template and the
//! minimal-holding set used when confidence or safety rules out direct or
//! fusion output. Grounded on the per-organ atom tables in
//! `atoms::catalog`; every meta-atom gets a hand-authored phrase, every
//! plain atom falls back to a template derived from its name.

use crate::organs::{OrganKind, RecommendedScale};

/// Output intensity, chosen by V0 and safety (spec.md §4.9 "direct...at
/// the intensity level chosen by V0 and safety").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intensity {
    Low,
    Medium,
    High,
}

impl Intensity {
    /// `V0 > 0.7 & safety=safe -> high; safety=breach -> low; else
    /// medium` (spec.md §4.9).
    pub fn choose(v0: f64, safety: crate::nexus::SafetyLevel) -> Self {
        use crate::nexus::SafetyLevel::*;
        match safety {
            Breach => Intensity::Low,
            Safe if v0 > 0.7 => Intensity::High,
            _ => Intensity::Medium,
        }
    }

    pub fn from_recommended_scale(scale: RecommendedScale) -> Self {
        match scale {
            RecommendedScale::Micro | RecommendedScale::Gentle => Intensity::Low,
            RecommendedScale::Moderate => Intensity::Medium,
            RecommendedScale::Full => Intensity::High,
        }
    }
}

fn meta_atom_phrase(atom: &str, intensity: Intensity) -> Option<&'static str> {
    Some(match (atom, intensity) {
        ("fierce_holding", Intensity::Low) => "I'm staying close to this with you.",
        ("fierce_holding", Intensity::Medium) => "I'm holding this fiercely, right alongside you.",
        ("fierce_holding", Intensity::High) => {
            "I'm not going anywhere. Whatever this is, we're holding it together, fiercely."
        }
        ("grounded_witnessing", Intensity::Low) => "I'm here, watching this with you.",
        ("grounded_witnessing", Intensity::Medium) => "I'm grounded here, witnessing this with you.",
        ("grounded_witnessing", Intensity::High) => {
            "I'm fully here, steady, witnessing every bit of this with you."
        }
        ("wise_tenderness", Intensity::Low) => "There might be something gentle to notice here.",
        ("wise_tenderness", Intensity::Medium) => "There's a tenderness in how you're making sense of this.",
        ("wise_tenderness", Intensity::High) => {
            "What you're arriving at here has both wisdom and real tenderness in it."
        }
        ("safe_enough_truth", Intensity::Low) => "It might be safe enough to say more, if you want.",
        ("safe_enough_truth", Intensity::Medium) => "This feels like a safe enough place to be honest.",
        ("safe_enough_truth", Intensity::High) => {
            "You're safe enough here to say the true thing, all the way through."
        }
        ("regulated_repair", Intensity::Low) => "Something in this is starting to settle.",
        ("regulated_repair", Intensity::Medium) => "There's a repair happening here, and it's settling you.",
        ("regulated_repair", Intensity::High) => {
            "You're coming back to steady ground, and the repair is holding."
        }
        ("urgent_grounding", Intensity::Low) => "Let's slow down, just a little.",
        ("urgent_grounding", Intensity::Medium) => "Let's get grounded before anything else.",
        ("urgent_grounding", Intensity::High) => {
            "Right now, let's just breathe and get both feet on the ground. That's all."
        }
        ("temporal_release", Intensity::Low) => "It might be okay to let that moment be over.",
        ("temporal_release", Intensity::Medium) => "That moment doesn't have to keep happening right now.",
        ("temporal_release", Intensity::High) => {
            "That was then. You get to let this one go and stay in now."
        }
        ("calibrated_intensity", Intensity::Low) => "We can take this as small as you need.",
        ("calibrated_intensity", Intensity::Medium) => "Let's meet this at a pace that actually fits.",
        ("calibrated_intensity", Intensity::High) => {
            "You can go at full intensity here if that's what's true."
        }
        ("attuned_bridge", Intensity::Low) => "I think I'm tracking what connects here.",
        ("attuned_bridge", Intensity::Medium) => "I'm with you, and I think I see what connects these.",
        ("attuned_bridge", Intensity::High) => {
            "I'm right there with you, and the thread connecting all of this is clear to me."
        }
        ("crystallized_insight", Intensity::Low) => "Something might be coming into focus.",
        ("crystallized_insight", Intensity::Medium) => "Something real is coming into focus here.",
        ("crystallized_insight", Intensity::High) => {
            "Something has crystallized here, and it's worth naming out loud."
        }
        _ => return None,
    })
}

/// Fallback phrase for a plain (non-meta) atom: turn its name into a
/// readable noun phrase framed at the given intensity.
pub fn phrase_for(atom: &str, intensity: Intensity) -> String {
    if let Some(p) = meta_atom_phrase(atom, intensity) {
        return p.to_string();
    }
    let readable = atom.replace('_', " ");
    match intensity {
        Intensity::Low => format!("There might be some {readable} here."),
        Intensity::Medium => format!("I notice {readable} here."),
        Intensity::High => format!("There's real {readable} here, and I want to name it."),
    }
}

/// `(action, quality)` role words per organ, for the fusion template
/// `"{action} {topic} {quality}?"` (spec.md §4.9).
pub fn role_words(organ: OrganKind) -> Option<(&'static str, &'static str)> {
    match organ {
        OrganKind::Listening => Some(("Can you tell me more about", "")),
        OrganKind::Empathy => Some(("I'm sitting with", "and how heavy it feels")),
        OrganKind::Presence => Some(("I'm staying present to", "right here with you")),
        OrganKind::Wisdom => Some(("I'm noticing a pattern in", "that might matter")),
        OrganKind::Authenticity => Some(("I want to name", "honestly")),
        _ => None,
    }
}

/// Curated minimal-holding phrases (spec.md §4.9 "below 0.50 confidence
/// and in Z5 or safety=breach, emit a minimal holding phrase from a
/// curated minimal-holding set").
pub const MINIMAL_HOLDING: &[&str] = &[
    "I'm here with you.",
    "Take whatever time you need. I'm not going anywhere.",
    "That sounds like a lot. I'm listening.",
    "I'm staying right here with you.",
    "You don't have to have words for this right now.",
];

pub fn minimal_holding(seed: usize) -> &'static str {
    MINIMAL_HOLDING[seed % MINIMAL_HOLDING.len()]
}
