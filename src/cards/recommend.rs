use std::cmp::Ordering;

use super::dto::{Candidate, CardRecipe};
use crate::recipes::repo_types::NutritionFacts;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthCondition {
    Diabetes,
    Hypertension,
    HeartDisease,
    HighCholesterol,
    Obesity,
}

impl HealthCondition {
    /// Case-insensitive, accepts the Indonesian names as well.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "diabetes" => Some(Self::Diabetes),
            "hypertension" | "hipertensi" => Some(Self::Hypertension),
            "heart disease" | "penyakit jantung" => Some(Self::HeartDisease),
            "high cholesterol" | "kolesterol tinggi" => Some(Self::HighCholesterol),
            "obesity" | "obesitas" => Some(Self::Obesity),
            _ => None,
        }
    }

    pub fn rule(self) -> &'static HealthRule {
        match self {
            Self::Diabetes => &DIABETES,
            Self::Hypertension => &HYPERTENSION,
            Self::HeartDisease => &HEART_DISEASE,
            Self::HighCholesterol => &HIGH_CHOLESTEROL,
            Self::Obesity => &OBESITY,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Nutrient {
    Carbohydrate,
    Protein,
    Fat,
    Fiber,
}

impl Nutrient {
    fn of(self, n: &NutritionFacts) -> f64 {
        match self {
            Self::Carbohydrate => n.carbohydrate,
            Self::Protein => n.protein,
            Self::Fat => n.fat,
            Self::Fiber => n.fiber,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Bound {
    AtLeast(f64),
    AtMost(f64),
}

#[derive(Debug, Clone, Copy)]
pub struct Threshold {
    pub nutrient: Nutrient,
    pub bound: Bound,
}

impl Threshold {
    const fn at_least(nutrient: Nutrient, v: f64) -> Self {
        Self { nutrient, bound: Bound::AtLeast(v) }
    }

    const fn at_most(nutrient: Nutrient, v: f64) -> Self {
        Self { nutrient, bound: Bound::AtMost(v) }
    }

    pub fn holds(&self, n: &NutritionFacts) -> bool {
        let value = self.nutrient.of(n);
        match self.bound {
            Bound::AtLeast(min) => value >= min,
            Bound::AtMost(max) => value <= max,
        }
    }
}

#[derive(Debug)]
pub struct HealthRule {
    pub avoid_categories: &'static [i64],
    pub criteria: &'static [Threshold],
}

impl HealthRule {
    fn satisfied_by(&self, n: &NutritionFacts) -> bool {
        self.criteria.iter().all(|t| t.holds(n))
    }
}

use self::Nutrient::{Carbohydrate, Fat, Fiber, Protein};

// Category 2 is snacks, 3 is soup (see the seed migration).
static DIABETES: HealthRule = HealthRule {
    avoid_categories: &[2],
    criteria: &[
        Threshold::at_least(Protein, 15.0),
        Threshold::at_least(Fiber, 2.0),
        Threshold::at_most(Carbohydrate, 30.0),
    ],
};
static HYPERTENSION: HealthRule = HealthRule {
    avoid_categories: &[3],
    criteria: &[Threshold::at_most(Fat, 10.0), Threshold::at_least(Protein, 10.0)],
};
static HEART_DISEASE: HealthRule = HealthRule {
    avoid_categories: &[2],
    criteria: &[Threshold::at_most(Fat, 8.0), Threshold::at_least(Fiber, 3.0)],
};
static HIGH_CHOLESTEROL: HealthRule = HealthRule {
    avoid_categories: &[],
    criteria: &[Threshold::at_least(Fiber, 3.0), Threshold::at_most(Fat, 10.0)],
};
static OBESITY: HealthRule = HealthRule {
    avoid_categories: &[],
    criteria: &[
        Threshold::at_least(Protein, 15.0),
        Threshold::at_most(Carbohydrate, 25.0),
        Threshold::at_most(Fat, 12.0),
    ],
};

/// The rules that apply to one user.
#[derive(Debug, Default)]
pub struct HealthFilter {
    rules: Vec<&'static HealthRule>,
}

impl HealthFilter {
    /// Unknown names are ignored.
    pub fn from_disease_names<S: AsRef<str>>(names: &[S]) -> Self {
        let mut conditions: Vec<HealthCondition> = Vec::new();
        for c in names.iter().filter_map(|n| HealthCondition::from_name(n.as_ref())) {
            if !conditions.contains(&c) {
                conditions.push(c);
            }
        }
        Self {
            rules: conditions.into_iter().map(HealthCondition::rule).collect(),
        }
    }

    /// Excluded categories are unioned; criteria hold when any one rule is met.
    /// A recipe without nutrition data never meets a criterion.
    pub fn admits(&self, category_id: i64, nutrition: Option<&NutritionFacts>) -> bool {
        if self.rules.is_empty() {
            return true;
        }
        if self
            .rules
            .iter()
            .any(|r| r.avoid_categories.contains(&category_id))
        {
            return false;
        }
        match nutrition {
            Some(n) => self.rules.iter().any(|r| r.satisfied_by(n)),
            None => false,
        }
    }
}

pub fn popularity_score(card: &CardRecipe) -> f64 {
    let reviews = (card.review_count as f64 / 10.0).min(1.0);
    card.rating * 0.7 + reviews * 0.3
}

pub fn health_score(nutrition: Option<&NutritionFacts>) -> f64 {
    let n = nutrition.cloned().unwrap_or(NutritionFacts {
        carbohydrate: 100.0,
        protein: 0.0,
        fat: 50.0,
        fiber: 0.0,
    });
    n.protein * 0.3 + n.fiber * 0.3 + (50.0 - n.fat) * 0.2 + (100.0 - n.carbohydrate) * 0.2
}

/// Score descending, then views descending, then id.
pub fn rank_by_popularity(cards: Vec<CardRecipe>) -> Vec<CardRecipe> {
    let mut scored: Vec<CardRecipe> = cards
        .into_iter()
        .map(|mut c| {
            c.score = Some(popularity_score(&c));
            c
        })
        .collect();
    scored.sort_by(|a, b| {
        cmp_desc(a.score, b.score)
            .then_with(|| b.view_count.cmp(&a.view_count))
            .then_with(|| a.id.cmp(&b.id))
    });
    scored
}

/// Keeps admitted candidates, health score descending, then rating, then id.
pub fn rank_by_health(candidates: &[Candidate], filter: &HealthFilter) -> Vec<CardRecipe> {
    let mut scored: Vec<CardRecipe> = candidates
        .iter()
        .filter_map(|c| {
            let nutrition = c.nutrition();
            if !filter.admits(c.category_id, nutrition.as_ref()) {
                return None;
            }
            let mut card = c.card.clone();
            card.score = Some(health_score(nutrition.as_ref()));
            Some(card)
        })
        .collect();
    scored.sort_by(|a, b| {
        cmp_desc(a.score, b.score)
            .then_with(|| b.rating.total_cmp(&a.rating))
            .then_with(|| a.id.cmp(&b.id))
    });
    scored
}

/// Picks `limit` recommendations for a user with the given disease names.
///
/// With no diseases the popularity ranking is used. Otherwise the health
/// ranking is used only when it yields at least `limit` recipes; a short
/// health list is thrown away in favour of the popularity ranking rather
/// than padded with it.
pub fn recommend<S: AsRef<str>>(
    candidates: Vec<Candidate>,
    diseases: &[S],
    limit: usize,
) -> Vec<CardRecipe> {
    if !diseases.is_empty() {
        let filter = HealthFilter::from_disease_names(diseases);
        let healthy = rank_by_health(&candidates, &filter);
        if healthy.len() >= limit {
            return healthy.into_iter().take(limit).collect();
        }
    }
    popular(candidates, limit)
}

pub fn popular(candidates: Vec<Candidate>, limit: usize) -> Vec<CardRecipe> {
    rank_by_popularity(candidates.into_iter().map(|c| c.card).collect())
        .into_iter()
        .take(limit)
        .collect()
}

fn cmp_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    b.unwrap_or(f64::MIN).total_cmp(&a.unwrap_or(f64::MIN))
}
