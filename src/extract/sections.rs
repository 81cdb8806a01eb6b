//! Detail-page section extractors
//!
//! Each function looks at one independent part of the page and returns a
//! partial [`DetailRecord`]. A section that is missing yields an empty
//! partial; a section whose markup changed only loses its own fields.

use crate::extract::dom::{
    all_in, deobfuscate_email, first_in, first_in_document, href_of, is_tag, label_matches,
    next_element_sibling, next_sibling_named, selector, text_of, text_opt,
};
use crate::record::{ApplicationDeadline, ContactDetails, DeadlineLink, DetailRecord};
use crate::url::resolve_href;
use scraper::{ElementRef, Html};
use url::Url;

/// Signature shared by every section extractor
pub(crate) type SectionExtractor = fn(&Html, &Url) -> DetailRecord;

/// Sections in the order they are merged; earlier sections win on conflicts
pub(crate) const SECTIONS: &[(&str, SectionExtractor)] = &[
    ("header", header),
    ("keyfacts", keyfacts),
    ("overview", overview),
    ("deadlines", application_deadlines),
    ("fees", fees),
    ("languages", languages),
    ("sidebar", sidebar),
];

fn set_once(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = value;
    }
}

fn set_once_vec(slot: &mut Vec<String>, value: Vec<String>) {
    if slot.is_empty() {
        *slot = value;
    }
}

/// Programme name and subtitle from the page header
pub(crate) fn header(document: &Html, _base: &Url) -> DetailRecord {
    let mut partial = DetailRecord::default();

    let Some(h2) = first_in_document(document, "h2.u-divider") else {
        return partial;
    };

    partial.name = first_in(h2, "span.u-text-primary").and_then(text_opt);
    partial.description = all_in(h2, "span").get(1).copied().and_then(text_opt);

    partial
}

/// The key-facts strip: degree, period of study, location, deadlines
pub(crate) fn keyfacts(document: &Html, base: &Url) -> DetailRecord {
    let mut partial = DetailRecord::default();

    let Some(item_selector) = selector("div.keyfact__item") else {
        return partial;
    };

    for item in document.select(&item_selector) {
        let Some(dt) = first_in(item, "dt") else {
            continue;
        };
        let label = text_of(dt);
        let dds = all_in(item, "dd");
        let values: Vec<String> = dds.iter().map(|dd| text_of(*dd)).collect();

        if label_matches(&label, "degree") {
            set_once(&mut partial.degree, values.first().cloned());
            set_once(
                &mut partial.program,
                values.get(1).or_else(|| values.first()).cloned(),
            );
        } else if label_matches(&label, "period of study") {
            set_once(&mut partial.standard_period_of_study, values.first().cloned());
        } else if label_matches(&label, "location") {
            set_once(&mut partial.location, values.first().cloned());
        } else if label_matches(&label, "deadline") {
            set_once_vec(
                &mut partial.deadlines,
                values
                    .into_iter()
                    .filter(|v| !v.to_lowercase().contains("enquire"))
                    .collect(),
            );
            let more_info = dds
                .iter()
                .filter_map(|dd| first_in(*dd, "a"))
                .filter_map(href_of)
                .find_map(|href| resolve_href(base, &href));
            set_once(&mut partial.deadline_moreinfo_link, more_info);
        }
    }

    partial
}

/// Paragraph following a heading, when the very next element is a `<p>`
fn adjacent_paragraph(heading: ElementRef<'_>) -> Option<String> {
    next_element_sibling(heading)
        .filter(|next| is_tag(*next, "p"))
        .and_then(text_opt)
}

/// The "Overview" tab: label-driven fields below `h4` headings
pub(crate) fn overview(document: &Html, _base: &Url) -> DetailRecord {
    let mut partial = DetailRecord::default();

    let Some(section) = first_in_document(document, "div#hsk-detail-overview") else {
        return partial;
    };

    // Headings and lists in document order, so "the next list after a
    // heading" is the first `ul` that follows it here.
    let ordered = all_in(section, "h4, ul");

    for (index, heading) in ordered.iter().enumerate() {
        if !is_tag(*heading, "h4") {
            continue;
        }
        let label = text_of(*heading);
        let next_list = || {
            ordered[index + 1..]
                .iter()
                .find(|e| is_tag(**e, "ul"))
                .map(|ul| all_in(*ul, "li").into_iter().map(text_of).collect::<Vec<_>>())
                .unwrap_or_default()
        };

        if label_matches(&label, "study type") {
            set_once(&mut partial.study_type, adjacent_paragraph(*heading));
        } else if label_matches(&label, "admission semester") {
            set_once(&mut partial.admission_semester, adjacent_paragraph(*heading));
        } else if label_matches(&label, "area of study") {
            set_once_vec(&mut partial.area_of_study, next_list());
        } else if label_matches(&label, "annotation") {
            set_once(&mut partial.annotation, adjacent_paragraph(*heading));
        } else if label_matches(&label, "admission modus") {
            set_once(&mut partial.admission_modus, adjacent_paragraph(*heading));
        } else if label_matches(&label, "lecture period") {
            set_once_vec(&mut partial.lecture_period, next_list());
        }
    }

    partial
}

/// The "Application deadlines" tab
pub(crate) fn application_deadlines(document: &Html, _base: &Url) -> DetailRecord {
    let mut partial = DetailRecord::default();

    let Some(section) = first_in_document(document, "div#hsk-detail-deadlines") else {
        return partial;
    };

    for item in all_in(section, "li.mb-16") {
        let mut entry = ApplicationDeadline {
            kind: first_in(item, "h5").and_then(text_opt),
            ..ApplicationDeadline::default()
        };

        let paragraphs = all_in(item, "p.js-dynamic-content");
        if let Some(first) = paragraphs.first() {
            entry.date = text_opt(*first);
        }
        if let Some(second) = paragraphs.get(1) {
            entry.comment = text_opt(*second);
            let links: Vec<DeadlineLink> = all_in(*second, "a[href]")
                .into_iter()
                .filter_map(|a| {
                    href_of(a).map(|url| DeadlineLink {
                        text: text_of(a),
                        url,
                    })
                })
                .collect();
            if !links.is_empty() {
                entry.links = Some(links);
            }
        }

        if !entry.is_empty() {
            partial.application_deadlines.push(entry);
        }
    }

    partial
}

/// The "Costs / funding" tab
pub(crate) fn fees(document: &Html, _base: &Url) -> DetailRecord {
    let mut partial = DetailRecord::default();

    let Some(section) = first_in_document(document, "div#hsk-detail-fees") else {
        return partial;
    };

    partial.tuition_fees_link = first_in(section, "a[href]").and_then(href_of);
    partial.tuition_fees_info = first_in(section, "p.js-dynamic-content").and_then(text_opt);

    partial
}

/// The "Languages" tab: heading is the language, next paragraph the detail
pub(crate) fn languages(document: &Html, _base: &Url) -> DetailRecord {
    let mut partial = DetailRecord::default();

    let Some(section) = first_in_document(document, "div#hsk-detail-languages") else {
        return partial;
    };

    for heading in all_in(section, "h4") {
        let language = text_of(heading);
        if language.is_empty() {
            continue;
        }
        if let Some(description) = next_sibling_named(heading, "p") {
            partial
                .languages_of_instruction
                .entry(language)
                .or_insert_with(|| text_of(description));
        }
    }

    partial
}

/// The sidebar: university name, website and contact blocks
pub(crate) fn sidebar(document: &Html, _base: &Url) -> DetailRecord {
    let mut partial = DetailRecord::default();

    let Some(aside) = first_in_document(document, "aside") else {
        return partial;
    };

    if let Some(link) = first_in(aside, "div.sidebar-head").and_then(|h| first_in(h, "a[href]")) {
        partial.university_website = href_of(link);
        partial.university_name = first_in(link, "span.sr-only")
            .map(text_of)
            .and_then(|full| full.split_once(" - ").map(|(name, _)| name.trim().to_string()))
            .filter(|name| !name.is_empty());
    }

    for block in all_in(aside, "div.qa-contact-list") {
        let Some(contact_type) = first_in(block, "h3").and_then(text_opt) else {
            continue;
        };
        partial
            .contacts
            .entry(contact_type)
            .or_insert_with(|| contact_details(block));
    }

    partial
}

fn contact_details(block: ElementRef<'_>) -> ContactDetails {
    let text_at = |css: &str| first_in(block, css).and_then(text_opt);

    ContactDetails {
        name: text_at("h4"),
        address: text_at("dd.qa-address"),
        zip: text_at("dd.qa-zip"),
        city: text_at("dd.qa-city"),
        phone: text_at("a.qa-phone"),
        fax: text_at("a.qa-fax"),
        email: text_at("a.qa-email").map(|raw| deobfuscate_email(&raw)),
        web: first_in(block, "a.qa-web").and_then(href_of),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://www.daad.de").unwrap()
    }

    fn run(extractor: SectionExtractor, html: &str) -> DetailRecord {
        extractor(&Html::parse_document(html), &base())
    }

    #[test]
    fn test_header() {
        let record = run(
            header,
            r#"<h2 class="u-divider"><span class="u-text-primary c-title">3D Animation</span>
               <span>Technische Hochschule Köln</span></h2>"#,
        );
        assert_eq!(record.name.as_deref(), Some("3D Animation"));
        assert_eq!(record.description.as_deref(), Some("Technische Hochschule Köln"));
    }

    #[test]
    fn test_keyfacts() {
        let record = run(
            keyfacts,
            r#"
            <div class="keyfact__item"><dt>Degree</dt><dd>Master of Arts</dd><dd>M.A. Animation</dd></div>
            <div class="keyfact__item"><dt>Standard period of study</dt><dd>4 semesters</dd></div>
            <div class="keyfact__item"><dt>Location</dt><dd>Cologne</dd></div>
            <div class="keyfact__item"><dt>Application deadline</dt>
                <dd>15 July</dd><dd>Please enquire <a href="/more-info">here</a></dd></div>
            "#,
        );
        assert_eq!(record.degree.as_deref(), Some("Master of Arts"));
        assert_eq!(record.program.as_deref(), Some("M.A. Animation"));
        assert_eq!(record.standard_period_of_study.as_deref(), Some("4 semesters"));
        assert_eq!(record.location.as_deref(), Some("Cologne"));
        assert_eq!(record.deadlines, vec!["15 July".to_string()]);
        assert_eq!(
            record.deadline_moreinfo_link.as_deref(),
            Some("https://www.daad.de/more-info")
        );
    }

    #[test]
    fn test_keyfacts_program_falls_back_to_degree() {
        let record = run(
            keyfacts,
            r#"<div class="keyfact__item"><dt>Degree</dt><dd>Bachelor</dd></div>"#,
        );
        assert_eq!(record.program.as_deref(), Some("Bachelor"));
    }

    #[test]
    fn test_overview_labels_and_lists() {
        let record = run(
            overview,
            r#"<div id="hsk-detail-overview">
                <h4>Study Type</h4><p>Full-time</p>
                <h4>Admission Semester</h4><p>Winter semester only</p>
                <h4>Area of study</h4><div><ul><li>Media</li><li>Design</li></ul></div>
                <h4>Admission modus</h4><p>Open</p>
                <h4>Lecture period</h4><ul><li>Oct - Feb</li><li>Apr - Jul</li></ul>
                <h4>Annotation</h4><div>not a paragraph</div>
            </div>"#,
        );
        assert_eq!(record.study_type.as_deref(), Some("Full-time"));
        assert_eq!(record.admission_semester.as_deref(), Some("Winter semester only"));
        assert_eq!(record.area_of_study, vec!["Media", "Design"]);
        assert_eq!(record.admission_modus.as_deref(), Some("Open"));
        assert_eq!(record.lecture_period, vec!["Oct - Feb", "Apr - Jul"]);
        assert_eq!(record.annotation, None);
    }

    #[test]
    fn test_overview_first_match_wins() {
        let record = run(
            overview,
            r#"<div id="hsk-detail-overview">
                <h4>Study type</h4><p>Full-time</p>
                <h4>Other study type</h4><p>Part-time</p>
            </div>"#,
        );
        assert_eq!(record.study_type.as_deref(), Some("Full-time"));
    }

    #[test]
    fn test_application_deadlines() {
        let record = run(
            application_deadlines,
            r#"<div id="hsk-detail-deadlines"><ul>
                <li class="mb-16"><h5>International applicants</h5>
                    <p class="js-dynamic-content">15 July</p>
                    <p class="js-dynamic-content">See <a href="https://uni.example/apply">portal</a></p>
                </li>
                <li class="mb-16"><h5>EU applicants</h5>
                    <p class="js-dynamic-content">1 September</p>
                </li>
                <li class="mb-16"></li>
            </ul></div>"#,
        );
        assert_eq!(record.application_deadlines.len(), 2);

        let first = &record.application_deadlines[0];
        assert_eq!(first.kind.as_deref(), Some("International applicants"));
        assert_eq!(first.date.as_deref(), Some("15 July"));
        assert_eq!(first.comment.as_deref(), Some("Seeportal"));
        assert_eq!(
            first.links,
            Some(vec![DeadlineLink {
                text: "portal".to_string(),
                url: "https://uni.example/apply".to_string(),
            }])
        );

        let second = &record.application_deadlines[1];
        assert_eq!(second.comment, None);
        assert_eq!(second.links, None);
    }

    #[test]
    fn test_missing_deadlines_section_is_empty() {
        let record = run(application_deadlines, "<html><body></body></html>");
        assert!(record.application_deadlines.is_empty());
    }

    #[test]
    fn test_fees() {
        let record = run(
            fees,
            r#"<div id="hsk-detail-fees">
                <a href="https://uni.example/fees">Fees</a>
                <p class="js-dynamic-content">None</p>
            </div>"#,
        );
        assert_eq!(record.tuition_fees_link.as_deref(), Some("https://uni.example/fees"));
        assert_eq!(record.tuition_fees_info.as_deref(), Some("None"));
    }

    #[test]
    fn test_languages() {
        let record = run(
            languages,
            r#"<div id="hsk-detail-languages">
                <h4>English</h4><p>C1 level</p>
                <h4>German</h4><span>-</span><p>Not required</p>
                <h4>French</h4>
            </div>"#,
        );
        assert_eq!(record.languages_of_instruction.len(), 2);
        assert_eq!(record.languages_of_instruction["English"], "C1 level");
        assert_eq!(record.languages_of_instruction["German"], "Not required");
    }

    #[test]
    fn test_sidebar_contacts_and_email() {
        let record = run(
            sidebar,
            r#"<aside>
                <div class="sidebar-head"><a href="https://th-koeln.de">
                    <span class="sr-only">TH Köln - University of Applied Sciences (opens in new tab)</span></a></div>
                <div class="qa-contact-list"><h3>Student advisory service</h3>
                    <h4>Ms Jane Doe</h4>
                    <dl><dd class="qa-address">Claudiusstr. 1</dd><dd class="qa-zip">50678</dd><dd class="qa-city">Köln</dd></dl>
                    <a class="qa-phone" href="tel:+49">+49 221 0</a>
                    <a class="qa-email" href="mailto:">jane.doe at th-koeln dot de</a>
                    <a class="qa-web" href="https://th-koeln.de/advice">Website</a>
                </div>
                <div class="qa-contact-list"><p>No heading, ignored</p></div>
            </aside>"#,
        );
        assert_eq!(record.university_website.as_deref(), Some("https://th-koeln.de"));
        assert_eq!(record.university_name.as_deref(), Some("TH Köln"));
        assert_eq!(record.contacts.len(), 1);

        let contact = &record.contacts["Student advisory service"];
        assert_eq!(contact.name.as_deref(), Some("Ms Jane Doe"));
        assert_eq!(contact.zip.as_deref(), Some("50678"));
        assert_eq!(contact.city.as_deref(), Some("Köln"));
        assert_eq!(contact.phone.as_deref(), Some("+49 221 0"));
        assert_eq!(contact.email.as_deref(), Some("jane.doe@th-koeln dot de"));
        assert_eq!(contact.web.as_deref(), Some("https://th-koeln.de/advice"));
        assert_eq!(contact.fax, None);
    }

    #[test]
    fn test_sidebar_name_requires_separator() {
        let record = run(
            sidebar,
            r#"<aside><div class="sidebar-head"><a href="https://uni.example">
                <span class="sr-only">Just a name</span></a></div></aside>"#,
        );
        assert_eq!(record.university_website.as_deref(), Some("https://uni.example"));
        assert_eq!(record.university_name, None);
    }
}
