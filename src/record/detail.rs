use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything extracted from one programme detail page
///
/// Every field is independently optional: `None` or an empty collection means
/// the page did not carry it. `link` is the primary key and always equals the
/// work-item key the page was fetched for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailRecord {
    // Identity
    pub name: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,

    // Classification
    pub degree: Option<String>,
    pub program: Option<String>,
    pub standard_period_of_study: Option<String>,
    pub location: Option<String>,
    pub deadlines: Vec<String>,
    pub deadline_moreinfo_link: Option<String>,
    pub study_type: Option<String>,
    pub admission_semester: Option<String>,
    pub area_of_study: Vec<String>,
    pub annotation: Option<String>,
    pub admission_modus: Option<String>,

    // Admission
    pub application_deadlines: Vec<ApplicationDeadline>,

    // Cost and language
    pub tuition_fees_link: Option<String>,
    pub tuition_fees_info: Option<String>,
    pub languages_of_instruction: BTreeMap<String, String>,

    // Logistics
    pub lecture_period: Vec<String>,

    // Affiliation
    pub university_name: Option<String>,
    pub university_website: Option<String>,
    pub contacts: BTreeMap<String, ContactDetails>,
}

/// One entry of the "Application deadlines" section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationDeadline {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<DeadlineLink>>,
}

impl ApplicationDeadline {
    pub fn is_empty(&self) -> bool {
        self.kind.is_none() && self.date.is_none() && self.comment.is_none() && self.links.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadlineLink {
    pub text: String,
    pub url: String,
}

/// A contact block from the sidebar
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fax: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web: Option<String>,
}

impl DetailRecord {
    /// Creates an empty record keyed by `link`
    pub fn for_link(link: impl Into<String>) -> Self {
        Self {
            link: Some(link.into()),
            ..Self::default()
        }
    }

    /// Merges a partial record produced by one section extractor
    ///
    /// Fields already set on `self` win; only unset scalars and empty
    /// collections are filled from `partial`.
    pub fn absorb(&mut self, partial: DetailRecord) {
        fill(&mut self.name, partial.name);
        fill(&mut self.link, partial.link);
        fill(&mut self.description, partial.description);
        fill(&mut self.degree, partial.degree);
        fill(&mut self.program, partial.program);
        fill(&mut self.standard_period_of_study, partial.standard_period_of_study);
        fill(&mut self.location, partial.location);
        fill_vec(&mut self.deadlines, partial.deadlines);
        fill(&mut self.deadline_moreinfo_link, partial.deadline_moreinfo_link);
        fill(&mut self.study_type, partial.study_type);
        fill(&mut self.admission_semester, partial.admission_semester);
        fill_vec(&mut self.area_of_study, partial.area_of_study);
        fill(&mut self.annotation, partial.annotation);
        fill(&mut self.admission_modus, partial.admission_modus);
        fill_vec(&mut self.application_deadlines, partial.application_deadlines);
        fill(&mut self.tuition_fees_link, partial.tuition_fees_link);
        fill(&mut self.tuition_fees_info, partial.tuition_fees_info);
        if self.languages_of_instruction.is_empty() {
            self.languages_of_instruction = partial.languages_of_instruction;
        }
        fill_vec(&mut self.lecture_period, partial.lecture_period);
        fill(&mut self.university_name, partial.university_name);
        fill(&mut self.university_website, partial.university_website);
        if self.contacts.is_empty() {
            self.contacts = partial.contacts;
        }
    }

    /// Returns true if nothing beyond `link` was extracted
    pub fn is_blank(&self) -> bool {
        let mut probe = self.clone();
        probe.link = None;
        probe == DetailRecord::default()
    }
}

fn fill(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = value;
    }
}

fn fill_vec<T>(slot: &mut Vec<T>, value: Vec<T>) {
    if slot.is_empty() {
        *slot = value;
    }
}
