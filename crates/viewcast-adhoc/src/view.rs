//! Ad hoc projection over plain JSON documents
//!
//! [`AdhocView`] gives untyped data the same projection surface as a
//! typed [`ViewModel`]: wrap a document, optionally attach a template
//! and mapping rules, and `project` it. Own properties of the wrapped
//! document pass straight through without needing a mapping rule;
//! rules fill in derived or computed fields.

use serde::{Serialize, Serializer};
use serde_json::Value;
use viewcast_core::{Error, FieldTemplates, MappingTable, Result, Template, ViewModel};

/// A plain JSON document with per-instance projection configuration.
///
/// Unlike typed projectables, whose template and mappings are per-type
/// constants, an `AdhocView` carries its own. The default template
/// starts empty, so a freshly wrapped document projects to `{}` until
/// a template (or a request) says otherwise.
///
/// ```rust,ignore
/// let view = AdhocView::new(json!({"name": "Ada", "address": {"city": "London"}}))
///     .with_template(Template::from_value(json!({"name": true}))?)
///     .with_mappings(MappingTable::new().path("city", "address.city"));
/// let out = view.project(Some(&Template::from_value(json!({"city": true}))?)).await?;
/// ```
pub struct AdhocView {
    source: Value,
    template: FieldTemplates,
    request: Option<Template>,
    mappings: MappingTable<AdhocView>,
}

impl AdhocView {
    /// Wrap a JSON document.
    pub fn new(source: Value) -> Self {
        Self {
            source,
            template: FieldTemplates::new(),
            request: None,
            mappings: MappingTable::new(),
        }
    }

    /// Serialize any value and wrap the result.
    pub fn wrap<T: Serialize>(value: &T) -> Result<Self> {
        let source = serde_json::to_value(value)
            .map_err(|e| Error::declaration(format!("cannot wrap value: {e}")))?;
        Ok(Self::new(source))
    }

    /// Attach a template.
    ///
    /// A [`Template::Fields`] object becomes the view's default
    /// template. Any other form (typically [`Template::Wildcard`]) is
    /// stored as the request to use when `project` is called without
    /// one; an explicit request still takes precedence.
    pub fn with_template(mut self, template: Template) -> Self {
        match template {
            Template::Fields(fields) => self.template = fields,
            other => self.request = Some(other),
        }
        self
    }

    /// Attach mapping rules for derived fields.
    pub fn with_mappings(mut self, mappings: MappingTable<AdhocView>) -> Self {
        self.mappings = mappings;
        self
    }

    /// The wrapped document.
    pub fn source(&self) -> &Value {
        &self.source
    }
}

impl Serialize for AdhocView {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.source.serialize(serializer)
    }
}

impl ViewModel for AdhocView {
    fn view_template(&self) -> &FieldTemplates {
        &self.template
    }

    fn view_mappings(&self) -> &MappingTable<Self> {
        &self.mappings
    }

    fn passthrough(&self) -> Option<&Value> {
        Some(&self.source)
    }

    fn stored_request(&self) -> Option<&Template> {
        self.request.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use viewcast_core::{Projectable, Raw};

    fn doc() -> Value {
        json!({
            "name": "Ada",
            "address": {"city": "London", "zip": "N1"},
            "tags": ["ops", "eng"]
        })
    }

    fn request(value: Value) -> Template {
        Template::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_empty_template_projects_to_empty_object() {
        let view = AdhocView::new(doc());
        assert_eq!(view.project(None).await.unwrap(), json!({}));
    }

    #[tokio::test]
    async fn test_own_properties_pass_through_verbatim() {
        let view = AdhocView::new(doc());
        let out = view
            .project(Some(&request(json!({"name": true, "address": true}))))
            .await
            .unwrap();

        // Non-projectable nested values are opaque: included whole.
        assert_eq!(
            out,
            json!({"name": "Ada", "address": {"city": "London", "zip": "N1"}})
        );
    }

    #[tokio::test]
    async fn test_default_template_shapes_projection() {
        let view = AdhocView::new(doc())
            .with_template(request(json!({"name": true, "tags": true})));
        assert_eq!(
            view.project(None).await.unwrap(),
            json!({"name": "Ada", "tags": ["ops", "eng"]})
        );
    }

    #[tokio::test]
    async fn test_mapping_rules_fill_derived_fields() {
        let view = AdhocView::new(doc()).with_mappings(
            MappingTable::new()
                .path("city", "address.city")
                .sync_fn("greeting", |view: &AdhocView| {
                    let name = view.source()["name"].as_str().unwrap_or("?");
                    Ok(Raw::from(json!(format!("hello, {name}"))))
                }),
        );
        let out = view
            .project(Some(&request(json!({"city": true, "greeting": true}))))
            .await
            .unwrap();
        assert_eq!(out, json!({"city": "London", "greeting": "hello, Ada"}));
    }

    #[tokio::test]
    async fn test_own_property_wins_over_mapping_rule() {
        let view = AdhocView::new(doc())
            .with_mappings(MappingTable::new().path("name", "address.city"));
        let out = view
            .project(Some(&request(json!({"name": true}))))
            .await
            .unwrap();
        assert_eq!(out, json!({"name": "Ada"}));
    }

    #[tokio::test]
    async fn test_timestamp_mapping_rule() {
        let view = AdhocView::new(json!({})).with_mappings(MappingTable::new().sync_fn(
            "generated_at",
            |_view| Ok(Raw::from(json!(chrono::Utc::now().to_rfc3339()))),
        ));
        let out = view
            .project(Some(&request(json!({"generated_at": true}))))
            .await
            .unwrap();
        let stamp = out["generated_at"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[tokio::test]
    async fn test_stored_wildcard_applies_when_no_request_given() {
        let view = AdhocView::new(doc())
            .with_template(Template::Wildcard)
            .with_mappings(MappingTable::new().path("city", "address.city"));
        let out = view.project(None).await.unwrap();

        // Document keys first, then mapping keys.
        let keys: Vec<_> = out.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["name", "address", "tags", "city"]);
        assert_eq!(out["city"], "London");
    }

    #[tokio::test]
    async fn test_explicit_request_overrides_stored_one() {
        let view = AdhocView::new(doc()).with_template(Template::Wildcard);
        let out = view
            .project(Some(&request(json!({"name": true}))))
            .await
            .unwrap();
        assert_eq!(out, json!({"name": "Ada"}));
    }

    #[tokio::test]
    async fn test_wrap_serializes_typed_values() {
        #[derive(Serialize)]
        struct Payload {
            id: u32,
        }
        let view = AdhocView::wrap(&Payload { id: 7 }).unwrap();
        let out = view
            .project(Some(&request(json!({"id": true}))))
            .await
            .unwrap();
        assert_eq!(out, json!({"id": 7}));
    }

    #[tokio::test]
    async fn test_failing_rule_names_the_field() {
        let view = AdhocView::new(json!({})).with_mappings(
            MappingTable::new()
                .sync_fn("broken", |_view| Err(Error::mapping("upstream unavailable"))),
        );
        let err = view
            .project(Some(&request(json!({"broken": true}))))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("'broken'"));
        assert!(err.to_string().contains("upstream unavailable"));
    }

    #[tokio::test]
    async fn test_nested_views_compose() {
        let view = AdhocView::new(json!({"name": "Ada"})).with_mappings(
            MappingTable::new().sync_fn("address", |_view| {
                Ok(Raw::nested(AdhocView::new(json!({
                    "city": "London",
                    "zip": "N1"
                }))))
            }),
        );
        let out = view
            .project(Some(&request(json!({"name": true, "address": {"city": true}}))))
            .await
            .unwrap();
        assert_eq!(out, json!({"name": "Ada", "address": {"city": "London"}}));
    }
}
