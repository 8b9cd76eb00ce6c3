//! PubMed efetch XML parsing.
//!
//! Event-driven state machine over the <PubmedArticleSet> structure.
//! Source records are inconsistently shaped; a missing or malformed
//! sub-field degrades to an empty/default value and never fails the
//! record, let alone the batch.

use medrag_common::{Author, MeshTerm, Paper};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::warn;

/// Parse efetch XML (db=pubmed, retmode=xml) into Paper values.
pub fn parse_pubmed_articles(xml: &str) -> anyhow::Result<Vec<Paper>> {
    let mut papers = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut current: Option<ArticleState> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = e.name();
                match name.as_ref() {
                    b"PubmedArticle" => current = Some(ArticleState::default()),
                    b"MedlineCitation" => flag(&mut current, |s| s.in_medline = true),
                    b"Article" => flag(&mut current, |s| s.in_article = true),
                    b"PMID" => flag(&mut current, |s| s.in_pmid = true),
                    b"ArticleTitle" => flag(&mut current, |s| s.in_title = true),
                    b"Abstract" => flag(&mut current, |s| s.in_abstract = true),
                    b"AbstractText" => flag(&mut current, |s| {
                        if s.in_abstract {
                            s.in_abstract_text = true;
                            s.abstract_parts.push(String::new());
                        }
                    }),
                    b"AuthorList" => flag(&mut current, |s| s.in_author_list = true),
                    b"Author" => flag(&mut current, |s| {
                        if s.in_author_list {
                            s.in_author = true;
                            s.author = PartialAuthor::default();
                        }
                    }),
                    b"LastName" => flag(&mut current, |s| s.in_last_name = s.in_author),
                    b"ForeName" => flag(&mut current, |s| s.in_fore_name = s.in_author),
                    b"CollectiveName" => flag(&mut current, |s| s.in_collective = s.in_author),
                    b"Affiliation" => flag(&mut current, |s| s.in_affiliation = s.in_author),
                    b"Journal" => flag(&mut current, |s| s.in_journal = true),
                    b"Title" => flag(&mut current, |s| s.in_journal_title = s.in_journal),
                    b"PubDate" => flag(&mut current, |s| s.in_pub_date = true),
                    b"Year" => flag(&mut current, |s| s.in_year = s.in_pub_date),
                    b"Month" => flag(&mut current, |s| s.in_month = s.in_pub_date),
                    b"Day" => flag(&mut current, |s| s.in_day = s.in_pub_date),
                    b"MeshHeading" => flag(&mut current, |s| {
                        s.in_mesh_heading = true;
                        s.mesh = MeshTerm::default();
                    }),
                    b"DescriptorName" => {
                        if let Some(s) = current.as_mut() {
                            if s.in_mesh_heading {
                                s.in_descriptor = true;
                                s.mesh.ui = attr(e, b"UI").unwrap_or_default();
                                s.mesh.major_topic =
                                    attr(e, b"MajorTopicYN").as_deref() == Some("Y");
                            }
                        }
                    }
                    b"QualifierName" => flag(&mut current, |s| {
                        if s.in_mesh_heading {
                            s.in_qualifier = true;
                            s.mesh.qualifiers.push(String::new());
                        }
                    }),
                    b"ArticleId" => {
                        if let Some(s) = current.as_mut() {
                            s.in_doi_id = attr(e, b"IdType").as_deref() == Some("doi");
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default();
                if let Some(s) = current.as_mut() {
                    s.push_text(&text);
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"MedlineCitation" => flag(&mut current, |s| s.in_medline = false),
                b"Article" => flag(&mut current, |s| s.in_article = false),
                b"PMID" => flag(&mut current, |s| s.in_pmid = false),
                b"ArticleTitle" => flag(&mut current, |s| s.in_title = false),
                b"Abstract" => flag(&mut current, |s| s.in_abstract = false),
                b"AbstractText" => flag(&mut current, |s| s.in_abstract_text = false),
                b"AuthorList" => flag(&mut current, |s| s.in_author_list = false),
                b"Author" => flag(&mut current, |s| s.finish_author()),
                b"LastName" => flag(&mut current, |s| s.in_last_name = false),
                b"ForeName" => flag(&mut current, |s| s.in_fore_name = false),
                b"CollectiveName" => flag(&mut current, |s| s.in_collective = false),
                b"Affiliation" => flag(&mut current, |s| s.finish_affiliation()),
                b"Journal" => flag(&mut current, |s| s.in_journal = false),
                b"Title" => flag(&mut current, |s| s.in_journal_title = false),
                b"PubDate" => flag(&mut current, |s| s.in_pub_date = false),
                b"Year" => flag(&mut current, |s| s.in_year = false),
                b"Month" => flag(&mut current, |s| s.in_month = false),
                b"Day" => flag(&mut current, |s| s.in_day = false),
                b"MeshHeading" => flag(&mut current, |s| s.finish_mesh()),
                b"DescriptorName" => flag(&mut current, |s| s.in_descriptor = false),
                b"QualifierName" => flag(&mut current, |s| s.in_qualifier = false),
                b"ArticleId" => flag(&mut current, |s| s.in_doi_id = false),
                b"PubmedArticle" => {
                    if let Some(s) = current.take() {
                        papers.push(s.into_paper());
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => {
                warn!("XML parse error: {err}");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(papers)
}

fn flag(current: &mut Option<ArticleState>, f: impl FnOnce(&mut ArticleState)) {
    if let Some(s) = current.as_mut() {
        f(s);
    }
}

fn attr(e: &quick_xml::events::BytesStart<'_>, name: &[u8]) -> Option<String> {
    e.try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

#[derive(Default)]
struct PartialAuthor {
    last_name: String,
    fore_name: String,
    collective: String,
    affiliations: Vec<String>,
    affiliation_buf: String,
}

/// Accumulator for one <PubmedArticle>.
#[derive(Default)]
struct ArticleState {
    pmid: String,
    title: String,
    abstract_parts: Vec<String>,
    authors: Vec<Author>,
    mesh_terms: Vec<MeshTerm>,
    journal: String,
    year: String,
    month: String,
    day: String,
    doi: String,
    author: PartialAuthor,
    mesh: MeshTerm,

    in_medline: bool,
    in_article: bool,
    in_pmid: bool,
    in_title: bool,
    in_abstract: bool,
    in_abstract_text: bool,
    in_author_list: bool,
    in_author: bool,
    in_last_name: bool,
    in_fore_name: bool,
    in_collective: bool,
    in_affiliation: bool,
    in_journal: bool,
    in_journal_title: bool,
    in_pub_date: bool,
    in_year: bool,
    in_month: bool,
    in_day: bool,
    in_mesh_heading: bool,
    in_descriptor: bool,
    in_qualifier: bool,
    in_doi_id: bool,
}

impl ArticleState {
    fn push_text(&mut self, text: &str) {
        // PMID elements also occur under CommentsCorrections; only the
        // citation-level one (outside <Article>) identifies the record.
        if self.in_pmid && self.in_medline && !self.in_article && self.pmid.is_empty() {
            self.pmid.push_str(text);
        } else if self.in_title && self.in_article {
            self.title.push_str(text);
        } else if self.in_abstract_text {
            if let Some(part) = self.abstract_parts.last_mut() {
                part.push_str(text);
            }
        } else if self.in_last_name {
            self.author.last_name.push_str(text);
        } else if self.in_fore_name {
            self.author.fore_name.push_str(text);
        } else if self.in_collective {
            self.author.collective.push_str(text);
        } else if self.in_affiliation {
            self.author.affiliation_buf.push_str(text);
        } else if self.in_journal_title {
            self.journal.push_str(text);
        } else if self.in_year {
            self.year.push_str(text);
        } else if self.in_month {
            self.month.push_str(text);
        } else if self.in_day {
            self.day.push_str(text);
        } else if self.in_descriptor {
            self.mesh.term.push_str(text);
        } else if self.in_qualifier {
            if let Some(q) = self.mesh.qualifiers.last_mut() {
                q.push_str(text);
            }
        } else if self.in_doi_id {
            self.doi.push_str(text);
        }
    }

    fn finish_affiliation(&mut self) {
        self.in_affiliation = false;
        let aff = std::mem::take(&mut self.author.affiliation_buf);
        if !aff.is_empty() {
            self.author.affiliations.push(aff);
        }
    }

    fn finish_author(&mut self) {
        if !self.in_author {
            return;
        }
        self.in_author = false;
        let partial = std::mem::take(&mut self.author);
        // An author with neither name parts nor a collective name is skipped.
        let author = if !partial.last_name.is_empty() && !partial.fore_name.is_empty() {
            Author {
                name: format!("{} {}", partial.fore_name, partial.last_name),
                first_name: partial.fore_name,
                last_name: partial.last_name,
                affiliations: partial.affiliations,
            }
        } else if !partial.collective.is_empty() {
            Author {
                name: partial.collective,
                first_name: String::new(),
                last_name: String::new(),
                affiliations: partial.affiliations,
            }
        } else {
            return;
        };
        self.authors.push(author);
    }

    fn finish_mesh(&mut self) {
        self.in_mesh_heading = false;
        let mesh = std::mem::take(&mut self.mesh);
        self.mesh_terms.push(mesh);
    }

    fn publication_date(&self) -> String {
        if self.year.is_empty() {
            return String::new();
        }
        let month = normalize_month(&self.month);
        let day = if self.day.is_empty() { "01".to_string() } else { zero_pad(&self.day) };
        format!("{}-{}-{}", self.year, month, day)
    }

    fn into_paper(self) -> Paper {
        Paper {
            publication_date: self.publication_date(),
            pmid: self.pmid,
            title: self.title,
            abstract_text: self.abstract_parts.join(" "),
            authors: self.authors,
            mesh_terms: self.mesh_terms,
            journal: self.journal,
            doi: self.doi,
        }
    }
}

fn normalize_month(month: &str) -> String {
    let mapped = match month {
        "Jan" => "01",
        "Feb" => "02",
        "Mar" => "03",
        "Apr" => "04",
        "May" => "05",
        "Jun" => "06",
        "Jul" => "07",
        "Aug" => "08",
        "Sep" => "09",
        "Oct" => "10",
        "Nov" => "11",
        "Dec" => "12",
        "" => "01",
        other => return zero_pad(other),
    };
    mapped.to_string()
}

fn zero_pad(value: &str) -> String {
    if value.len() == 1 {
        format!("0{value}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0"?>
<PubmedArticleSet>
  <PubmedArticle>
    <MedlineCitation>
      <PMID Version="1">12345678</PMID>
      <Article>
        <Journal>
          <Title>Nature</Title>
          <JournalIssue><PubDate><Year>2023</Year><Month>Apr</Month><Day>5</Day></PubDate></JournalIssue>
        </Journal>
        <ArticleTitle>KRAS G12D in pancreatic cancer</ArticleTitle>
        <Abstract>
          <AbstractText Label="BACKGROUND">First part.</AbstractText>
          <AbstractText Label="RESULTS">Second part.</AbstractText>
        </Abstract>
        <AuthorList>
          <Author>
            <LastName>Doe</LastName>
            <ForeName>Jane</ForeName>
            <AffiliationInfo><Affiliation>MIT</Affiliation></AffiliationInfo>
            <AffiliationInfo><Affiliation>Broad Institute</Affiliation></AffiliationInfo>
          </Author>
          <Author><CollectiveName>The CRISPR Consortium</CollectiveName></Author>
          <Author><Initials>X</Initials></Author>
        </AuthorList>
      </Article>
      <MeshHeadingList>
        <MeshHeading>
          <DescriptorName UI="D009369" MajorTopicYN="Y">Neoplasms</DescriptorName>
          <QualifierName UI="Q000628" MajorTopicYN="N">therapy</QualifierName>
          <QualifierName UI="Q000235" MajorTopicYN="N">genetics</QualifierName>
        </MeshHeading>
        <MeshHeading>
          <DescriptorName UI="D016254" MajorTopicYN="N">CRISPR-Cas Systems</DescriptorName>
        </MeshHeading>
      </MeshHeadingList>
    </MedlineCitation>
    <PubmedData>
      <ArticleIdList>
        <ArticleId IdType="pubmed">12345678</ArticleId>
        <ArticleId IdType="doi">10.1038/test</ArticleId>
      </ArticleIdList>
    </PubmedData>
  </PubmedArticle>
</PubmedArticleSet>"#;

    #[test]
    fn parses_full_article() {
        let papers = parse_pubmed_articles(SAMPLE).unwrap();
        assert_eq!(papers.len(), 1);
        let p = &papers[0];
        assert_eq!(p.pmid, "12345678");
        assert_eq!(p.title, "KRAS G12D in pancreatic cancer");
        assert_eq!(p.abstract_text, "First part. Second part.");
        assert_eq!(p.journal, "Nature");
        assert_eq!(p.publication_date, "2023-04-05");
        assert_eq!(p.doi, "10.1038/test");
    }

    #[test]
    fn authors_tolerate_missing_name_parts() {
        let papers = parse_pubmed_articles(SAMPLE).unwrap();
        let authors = &papers[0].authors;
        // The initials-only author is skipped.
        assert_eq!(authors.len(), 2);
        assert_eq!(authors[0].name, "Jane Doe");
        assert_eq!(authors[0].first_name, "Jane");
        assert_eq!(authors[0].last_name, "Doe");
        assert_eq!(authors[0].affiliations, vec!["MIT", "Broad Institute"]);
        assert_eq!(authors[1].name, "The CRISPR Consortium");
        assert!(authors[1].last_name.is_empty());
    }

    #[test]
    fn mesh_terms_carry_attributes_and_qualifiers() {
        let papers = parse_pubmed_articles(SAMPLE).unwrap();
        let mesh = &papers[0].mesh_terms;
        assert_eq!(mesh.len(), 2);
        assert_eq!(mesh[0].ui, "D009369");
        assert_eq!(mesh[0].term, "Neoplasms");
        assert!(mesh[0].major_topic);
        assert_eq!(mesh[0].qualifiers, vec!["therapy", "genetics"]);
        assert!(!mesh[1].major_topic);
        assert!(mesh[1].qualifiers.is_empty());
    }

    #[test]
    fn missing_abstract_and_date_default_to_empty() {
        let xml = r#"<PubmedArticleSet><PubmedArticle><MedlineCitation>
            <PMID>99</PMID>
            <Article><ArticleTitle>Bare record</ArticleTitle></Article>
        </MedlineCitation></PubmedArticle></PubmedArticleSet>"#;
        let papers = parse_pubmed_articles(xml).unwrap();
        assert_eq!(papers.len(), 1);
        assert_eq!(papers[0].pmid, "99");
        assert!(papers[0].abstract_text.is_empty());
        assert!(papers[0].publication_date.is_empty());
        assert!(papers[0].doi.is_empty());
    }

    #[test]
    fn numeric_month_is_zero_padded() {
        assert_eq!(normalize_month("4"), "04");
        assert_eq!(normalize_month("Nov"), "11");
        assert_eq!(normalize_month(""), "01");
        assert_eq!(normalize_month("12"), "12");
    }
}
