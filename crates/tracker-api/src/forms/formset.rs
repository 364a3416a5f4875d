//! # Line-Item Formsets
//!
//! A formset is a prefixed collection of subforms posted together with the
//! ticket form, one subform per line item. The wire format is the one the
//! client-side "add another row" script speaks:
//!
//! ```text
//! mediainfo-TOTAL_FORMS=3          number of subforms posted
//! mediainfo-INITIAL_FORMS=1        leading subforms that edit existing items
//! mediainfo-0-id=<uuid>            existing item edited by subform 0
//! mediainfo-0-description=...      subform fields
//! mediainfo-0-DELETE=on            delete the item (edit mode only)
//! mediainfo-1-description=...      extra subforms create new items
//! ```
//!
//! Management data that is missing, not a number, or names items that do
//! not belong to the ticket is a [`ManagementError`]: the payload was not
//! produced by our form and is rejected as a whole. Everything else is user
//! input and ends up as per-field errors.
//!
//! Extra subforms left completely blank are ignored. Deleted subforms are
//! not validated. A bound formset renders one blank subform more than was
//! posted, so the page always has a template row to clone.

use std::collections::{BTreeMap, HashSet};
use std::fmt::Display;

use serde::Serialize;
use thiserror::Error;
use tracker_core::line_item::{AMOUNT_MAX_DIGITS, DESCRIPTION_MAX, URL_MAX};
use tracker_core::{Expediture, ExpeditureId, MediaInfo, MediaInfoId, Money, TicketId};
use utoipa::ToSchema;

use super::{
    clean_amount, clean_optional_count, clean_optional_url, clean_text, FieldErrors, FormData,
};
use crate::error::AppError;

/// Upper bound on `TOTAL_FORMS`.
pub const MAX_NUM_FORMS: usize = 1000;

/// A formset payload that cannot be interpreted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ManagementError {
    /// `TOTAL_FORMS` or `INITIAL_FORMS` missing, not a number, or inconsistent.
    #[error("ManagementForm data is missing or has been tampered with ({prefix})")]
    Tampered { prefix: &'static str },

    /// More subforms than [`MAX_NUM_FORMS`].
    #[error("ManagementForm data is missing or has been tampered with ({prefix}: {total} forms exceeds the maximum)")]
    TooManyForms { prefix: &'static str, total: usize },

    /// An initial subform whose `id` is missing or names no item of the ticket.
    #[error("{prefix}-{index}-id does not name an item of this ticket")]
    UnknownItem { prefix: &'static str, index: usize },

    /// Two initial subforms edit the same item.
    #[error("{prefix}-{index}-id edits an item already edited by another form")]
    DuplicateItem { prefix: &'static str, index: usize },
}

impl From<ManagementError> for AppError {
    fn from(err: ManagementError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Per-page formset behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormsetOptions {
    /// Blank subforms rendered after the existing items.
    pub extra: usize,
    /// Whether initial subforms may delete their item.
    pub can_delete: bool,
}

impl FormsetOptions {
    /// Ticket creation: two blank rows, nothing to delete.
    pub const CREATE: Self = Self {
        extra: 2,
        can_delete: false,
    };
    /// Ticket editing: one blank row, existing rows deletable.
    pub const EDIT: Self = Self {
        extra: 1,
        can_delete: true,
    };
}

/// Raw subform values by field name.
pub type RowValues = BTreeMap<&'static str, String>;

/// A line-item subform: which fields it has and how its cleaned data turns
/// into a stored item.
pub trait LineItemForm: Sized {
    /// The stored record.
    type Item: Clone;
    /// The record's identifier.
    type Id: Copy + Eq + std::hash::Hash + Display;

    /// Wire prefix of the formset.
    const PREFIX: &'static str;
    /// Subform field names.
    const FIELDS: &'static [&'static str];

    fn item_id(item: &Self::Item) -> Self::Id;
    fn parse_id(raw: &str) -> Option<Self::Id>;

    /// Field values shown for an existing item.
    fn initial(item: &Self::Item) -> RowValues;

    /// Clean a subform, recording field errors.
    fn clean(values: &RowValues, errors: &mut FieldErrors) -> Option<Self>;

    /// Build a new item for `ticket`.
    fn create(self, ticket: TicketId) -> Self::Item;

    /// Overwrite an existing item's fields.
    fn apply_to(self, item: &mut Self::Item);
}

struct Row<F: LineItemForm> {
    existing: Option<F::Item>,
    values: RowValues,
    errors: FieldErrors,
    deleted: bool,
    blank: bool,
    cleaned: Option<F>,
}

impl<F: LineItemForm> Row<F> {
    fn needs_validation(&self) -> bool {
        !self.deleted && !self.blank
    }

    fn changed(&self) -> bool {
        match &self.existing {
            Some(item) => F::initial(item) != self.values,
            None => true,
        }
    }
}

/// What saving a valid formset does to the stored items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormsetChanges<T> {
    pub created: Vec<T>,
    pub updated: Vec<T>,
    pub deleted: Vec<T>,
}

impl<T> Default for FormsetChanges<T> {
    fn default() -> Self {
        Self {
            created: Vec::new(),
            updated: Vec::new(),
            deleted: Vec::new(),
        }
    }
}

impl<T> FormsetChanges<T> {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }
}

/// Management values rendered with the formset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ManagementView {
    pub total_forms: usize,
    pub initial_forms: usize,
    pub min_num_forms: usize,
    pub max_num_forms: usize,
}

/// Render context of one subform.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubformView {
    /// Field name prefix, e.g. `mediainfo-0`.
    pub prefix: String,
    /// Item edited by this subform, for initial subforms.
    pub id: Option<String>,
    #[schema(value_type = Object)]
    pub values: BTreeMap<&'static str, String>,
    #[schema(value_type = Object)]
    pub errors: FieldErrors,
    pub delete: bool,
}

/// Render context of a formset.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FormsetView {
    pub prefix: &'static str,
    pub management: ManagementView,
    pub can_delete: bool,
    pub forms: Vec<SubformView>,
}

/// A formset, unbound (existing items plus blank rows) or bound to a post.
pub struct Formset<F: LineItemForm> {
    options: FormsetOptions,
    bound: bool,
    rows: Vec<Row<F>>,
}

impl<F: LineItemForm> Formset<F> {
    /// Formset over the ticket's existing items, for a GET.
    pub fn unbound(options: FormsetOptions, items: Vec<F::Item>) -> Self {
        let mut rows: Vec<Row<F>> = items
            .into_iter()
            .map(|item| Row {
                values: F::initial(&item),
                existing: Some(item),
                errors: FieldErrors::default(),
                deleted: false,
                blank: false,
                cleaned: None,
            })
            .collect();
        rows.extend((0..options.extra).map(|_| blank_row()));
        Self {
            options,
            bound: false,
            rows,
        }
    }

    /// Bind posted data against the ticket's existing items.
    pub fn bind(
        options: FormsetOptions,
        items: Vec<F::Item>,
        data: &FormData,
    ) -> Result<Self, ManagementError> {
        let prefix = F::PREFIX;
        let management = |name: &str| -> Result<usize, ManagementError> {
            data.get(&format!("{prefix}-{name}"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .ok_or(ManagementError::Tampered { prefix })
        };
        let total = management("TOTAL_FORMS")?;
        let initial = management("INITIAL_FORMS")?;
        if total > MAX_NUM_FORMS {
            return Err(ManagementError::TooManyForms { prefix, total });
        }
        if initial > total {
            return Err(ManagementError::Tampered { prefix });
        }

        let mut seen = HashSet::new();
        let mut rows = Vec::with_capacity(total);
        for index in 0..total {
            let key = |field: &str| format!("{prefix}-{index}-{field}");
            let values: RowValues = F::FIELDS
                .iter()
                .map(|field| (*field, data.value(&key(field)).to_string()))
                .collect();

            let existing = if index < initial {
                let id = F::parse_id(data.value(&key("id")))
                    .ok_or(ManagementError::UnknownItem { prefix, index })?;
                let item = items
                    .iter()
                    .find(|item| F::item_id(item) == id)
                    .cloned()
                    .ok_or(ManagementError::UnknownItem { prefix, index })?;
                if !seen.insert(id) {
                    return Err(ManagementError::DuplicateItem { prefix, index });
                }
                Some(item)
            } else {
                None
            };

            let deleted = options.can_delete && existing.is_some() && data.flag(&key("DELETE"));
            let blank = existing.is_none() && values.values().all(String::is_empty);

            let mut row = Row {
                existing,
                values,
                errors: FieldErrors::default(),
                deleted,
                blank,
                cleaned: None,
            };
            if row.needs_validation() {
                row.cleaned = F::clean(&row.values, &mut row.errors);
            }
            rows.push(row);
        }

        Ok(Self {
            options,
            bound: true,
            rows,
        })
    }

    /// Drop validation results, for a formset the selected topic does not
    /// use. Its values are still rendered; its errors are not.
    pub fn skip_validation(mut self) -> Self {
        for row in &mut self.rows {
            row.errors = FieldErrors::default();
            row.cleaned = None;
        }
        self
    }

    /// Whether every subform that needs validation cleaned successfully.
    pub fn is_valid(&self) -> bool {
        self.bound
            && self
                .rows
                .iter()
                .filter(|row| row.needs_validation())
                .all(|row| row.cleaned.is_some())
    }

    /// Consume a bound formset into the item changes it asks for. Subforms
    /// that failed validation contribute nothing; callers check
    /// [`Formset::is_valid`] first.
    pub fn into_changes(self, ticket: TicketId) -> FormsetChanges<F::Item> {
        let mut changes = FormsetChanges::default();
        for row in self.rows {
            let changed = row.changed();
            match (row.existing, row.cleaned) {
                (Some(item), _) if row.deleted => changes.deleted.push(item),
                (Some(mut item), Some(cleaned)) if changed => {
                    cleaned.apply_to(&mut item);
                    changes.updated.push(item);
                }
                (None, Some(cleaned)) => changes.created.push(cleaned.create(ticket)),
                _ => {}
            }
        }
        changes
    }

    pub fn view(&self) -> FormsetView {
        let prefix = F::PREFIX;
        let mut forms: Vec<SubformView> = self
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| SubformView {
                prefix: format!("{prefix}-{index}"),
                id: row.existing.as_ref().map(|item| F::item_id(item).to_string()),
                values: row.values.clone(),
                errors: row.errors.clone(),
                delete: row.deleted,
            })
            .collect();
        if self.bound {
            forms.push(SubformView {
                prefix: format!("{prefix}-{}", forms.len()),
                id: None,
                values: blank_row::<F>().values,
                errors: FieldErrors::default(),
                delete: false,
            });
        }

        FormsetView {
            prefix,
            management: ManagementView {
                total_forms: forms.len(),
                initial_forms: self.rows.iter().filter(|r| r.existing.is_some()).count(),
                min_num_forms: 0,
                max_num_forms: MAX_NUM_FORMS,
            },
            can_delete: self.options.can_delete,
            forms,
        }
    }
}

fn blank_row<F: LineItemForm>() -> Row<F> {
    Row {
        existing: None,
        values: F::FIELDS.iter().map(|f| (*f, String::new())).collect(),
        errors: FieldErrors::default(),
        deleted: false,
        blank: true,
        cleaned: None,
    }
}

// -- Media --------------------------------------------------------------------

/// Cleaned media subform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaForm {
    pub description: String,
    pub url: Option<String>,
    pub count: Option<u32>,
}

impl LineItemForm for MediaForm {
    type Item = MediaInfo;
    type Id = MediaInfoId;

    const PREFIX: &'static str = "mediainfo";
    const FIELDS: &'static [&'static str] = &["url", "description", "count"];

    fn item_id(item: &MediaInfo) -> MediaInfoId {
        item.id
    }

    fn parse_id(raw: &str) -> Option<MediaInfoId> {
        MediaInfoId::parse(raw)
    }

    fn initial(item: &MediaInfo) -> RowValues {
        RowValues::from([
            ("url", item.url.clone().unwrap_or_default()),
            ("description", item.description.clone()),
            ("count", item.count.map(|c| c.to_string()).unwrap_or_default()),
        ])
    }

    fn clean(values: &RowValues, errors: &mut FieldErrors) -> Option<Self> {
        let get = |f: &str| values.get(f).map(String::as_str).unwrap_or("");
        let url = clean_optional_url(get("url"), "url", URL_MAX, errors);
        let description = clean_text(get("description"), "description", true, Some(DESCRIPTION_MAX), errors);
        let count = clean_optional_count(get("count"), "count", errors);
        match (url, description, count) {
            (Ok(url), Some(description), Ok(count)) => Some(Self {
                description,
                url,
                count,
            }),
            _ => None,
        }
    }

    fn create(self, ticket: TicketId) -> MediaInfo {
        MediaInfo::new(ticket, self.description, self.url, self.count)
    }

    fn apply_to(self, item: &mut MediaInfo) {
        item.description = self.description;
        item.url = self.url;
        item.count = self.count;
    }
}

// -- Expenses -----------------------------------------------------------------

/// Cleaned expense subform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpeditureForm {
    pub description: String,
    pub amount: Money,
}

impl LineItemForm for ExpeditureForm {
    type Item = Expediture;
    type Id = ExpeditureId;

    const PREFIX: &'static str = "expediture";
    const FIELDS: &'static [&'static str] = &["description", "amount"];

    fn item_id(item: &Expediture) -> ExpeditureId {
        item.id
    }

    fn parse_id(raw: &str) -> Option<ExpeditureId> {
        ExpeditureId::parse(raw)
    }

    fn initial(item: &Expediture) -> RowValues {
        RowValues::from([
            ("description", item.description.clone()),
            ("amount", item.amount.to_string()),
        ])
    }

    fn clean(values: &RowValues, errors: &mut FieldErrors) -> Option<Self> {
        let get = |f: &str| values.get(f).map(String::as_str).unwrap_or("");
        let description = clean_text(get("description"), "description", true, Some(DESCRIPTION_MAX), errors);
        let amount = clean_amount(get("amount"), "amount", AMOUNT_MAX_DIGITS, errors);
        Some(Self {
            description: description?,
            amount: amount?,
        })
    }

    fn create(self, ticket: TicketId) -> Expediture {
        Expediture::new(ticket, self.description, self.amount)
    }

    fn apply_to(self, item: &mut Expediture) {
        item.description = self.description;
        item.amount = self.amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::REQUIRED;

    const TAMPERED: &str = "ManagementForm data is missing or has been tampered with";

    fn data(pairs: &[(&str, &str)]) -> FormData {
        FormData::from_pairs(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn expense(ticket: TicketId, desc: &str, cents: i64) -> Expediture {
        Expediture::new(ticket, desc, Money::from_cents(cents))
    }

    #[test]
    fn missing_management_data_is_tampered() {
        let err = Formset::<MediaForm>::bind(FormsetOptions::CREATE, vec![], &data(&[]))
            .err()
            .unwrap();
        assert_eq!(err, ManagementError::Tampered { prefix: "mediainfo" });
        assert!(err.to_string().starts_with(TAMPERED));
    }

    #[test]
    fn non_numeric_management_data_is_tampered() {
        let d = data(&[("expediture-TOTAL_FORMS", "two"), ("expediture-INITIAL_FORMS", "0")]);
        assert!(Formset::<ExpeditureForm>::bind(FormsetOptions::CREATE, vec![], &d).is_err());
    }

    #[test]
    fn too_many_forms_rejected() {
        let d = data(&[("expediture-TOTAL_FORMS", "1001"), ("expediture-INITIAL_FORMS", "0")]);
        let err = Formset::<ExpeditureForm>::bind(FormsetOptions::CREATE, vec![], &d)
            .err()
            .unwrap();
        assert!(matches!(err, ManagementError::TooManyForms { total: 1001, .. }));
    }

    #[test]
    fn blank_extra_forms_are_ignored() {
        let d = data(&[
            ("expediture-TOTAL_FORMS", "2"),
            ("expediture-INITIAL_FORMS", "0"),
            ("expediture-0-description", ""),
            ("expediture-0-amount", ""),
        ]);
        let formset = Formset::<ExpeditureForm>::bind(FormsetOptions::CREATE, vec![], &d).unwrap();
        assert!(formset.is_valid());
        assert!(formset.into_changes(TicketId::new()).is_empty());
    }

    #[test]
    fn partially_filled_extra_form_is_validated() {
        let d = data(&[
            ("expediture-TOTAL_FORMS", "1"),
            ("expediture-INITIAL_FORMS", "0"),
            ("expediture-0-description", "train"),
        ]);
        let formset = Formset::<ExpeditureForm>::bind(FormsetOptions::CREATE, vec![], &d).unwrap();
        assert!(!formset.is_valid());
        let view = formset.view();
        assert_eq!(view.forms[0].errors.get("amount"), [REQUIRED.to_string()]);
    }

    #[test]
    fn extra_forms_create_items() {
        let ticket = TicketId::new();
        let d = data(&[
            ("expediture-TOTAL_FORMS", "2"),
            ("expediture-INITIAL_FORMS", "0"),
            ("expediture-0-description", "train"),
            ("expediture-0-amount", "120.50"),
        ]);
        let formset = Formset::<ExpeditureForm>::bind(FormsetOptions::CREATE, vec![], &d).unwrap();
        assert!(formset.is_valid());
        let changes = formset.into_changes(ticket);
        assert_eq!(changes.created.len(), 1);
        assert_eq!(changes.created[0].ticket, ticket);
        assert_eq!(changes.created[0].amount, Money::from_cents(12_050));
    }

    #[test]
    fn initial_forms_update_only_when_changed() {
        let ticket = TicketId::new();
        let same = expense(ticket, "train", 1_000);
        let edited = expense(ticket, "hotel", 5_000);
        let (same_id, edited_id) = (same.id.to_string(), edited.id.to_string());
        let d = data(&[
            ("expediture-TOTAL_FORMS", "2"),
            ("expediture-INITIAL_FORMS", "2"),
            ("expediture-0-id", &same_id),
            ("expediture-0-description", "train"),
            ("expediture-0-amount", "10.00"),
            ("expediture-1-id", &edited_id),
            ("expediture-1-description", "hotel"),
            ("expediture-1-amount", "45"),
        ]);
        let formset =
            Formset::<ExpeditureForm>::bind(FormsetOptions::EDIT, vec![same, edited.clone()], &d)
                .unwrap();
        assert!(formset.is_valid());
        let changes = formset.into_changes(ticket);
        assert_eq!(changes.updated.len(), 1);
        assert_eq!(changes.updated[0].id, edited.id);
        assert_eq!(changes.updated[0].amount, Money::from_cents(4_500));
    }

    #[test]
    fn deleted_forms_are_not_validated() {
        let ticket = TicketId::new();
        let item = expense(ticket, "train", 1_000);
        let id = item.id.to_string();
        let d = data(&[
            ("expediture-TOTAL_FORMS", "1"),
            ("expediture-INITIAL_FORMS", "1"),
            ("expediture-0-id", &id),
            ("expediture-0-description", ""),
            ("expediture-0-amount", "not money"),
            ("expediture-0-DELETE", "on"),
        ]);
        let formset =
            Formset::<ExpeditureForm>::bind(FormsetOptions::EDIT, vec![item.clone()], &d).unwrap();
        assert!(formset.is_valid());
        let changes = formset.into_changes(ticket);
        assert_eq!(changes.deleted, vec![item]);
    }

    #[test]
    fn delete_flag_ignored_without_can_delete() {
        let ticket = TicketId::new();
        let item = expense(ticket, "train", 1_000);
        let id = item.id.to_string();
        let d = data(&[
            ("expediture-TOTAL_FORMS", "1"),
            ("expediture-INITIAL_FORMS", "1"),
            ("expediture-0-id", &id),
            ("expediture-0-description", "train"),
            ("expediture-0-amount", "10"),
            ("expediture-0-DELETE", "on"),
        ]);
        let formset =
            Formset::<ExpeditureForm>::bind(FormsetOptions::CREATE, vec![item], &d).unwrap();
        assert!(formset.into_changes(ticket).deleted.is_empty());
    }

    #[test]
    fn foreign_item_id_is_rejected() {
        let stranger = expense(TicketId::new(), "elsewhere", 100).id.to_string();
        let d = data(&[
            ("expediture-TOTAL_FORMS", "1"),
            ("expediture-INITIAL_FORMS", "1"),
            ("expediture-0-id", &stranger),
        ]);
        let err = Formset::<ExpeditureForm>::bind(FormsetOptions::EDIT, vec![], &d)
            .err()
            .unwrap();
        assert_eq!(err, ManagementError::UnknownItem { prefix: "expediture", index: 0 });
    }

    #[test]
    fn initial_forms_above_total_is_tampered() {
        let ticket = TicketId::new();
        let items = vec![expense(ticket, "train", 100), expense(ticket, "hotel", 200)];
        let d = data(&[
            ("expediture-TOTAL_FORMS", "1"),
            ("expediture-INITIAL_FORMS", "2"),
            ("expediture-0-id", &items[0].id.to_string()),
            ("expediture-1-id", &items[1].id.to_string()),
        ]);
        let err = Formset::<ExpeditureForm>::bind(FormsetOptions::EDIT, items, &d)
            .err()
            .unwrap();
        assert_eq!(err, ManagementError::Tampered { prefix: "expediture" });
        assert!(err.to_string().contains(TAMPERED));
    }

    #[test]
    fn initial_form_without_id_is_rejected() {
        let item = expense(TicketId::new(), "train", 100);
        let d = data(&[
            ("expediture-TOTAL_FORMS", "1"),
            ("expediture-INITIAL_FORMS", "1"),
            ("expediture-0-description", "train"),
            ("expediture-0-amount", "1.00"),
        ]);
        let err = Formset::<ExpeditureForm>::bind(FormsetOptions::EDIT, vec![item], &d)
            .err()
            .unwrap();
        assert_eq!(err, ManagementError::UnknownItem { prefix: "expediture", index: 0 });
    }

    #[test]
    fn duplicate_item_id_is_rejected() {
        let ticket = TicketId::new();
        let item = expense(ticket, "train", 100);
        let id = item.id.to_string();
        let d = data(&[
            ("expediture-TOTAL_FORMS", "2"),
            ("expediture-INITIAL_FORMS", "2"),
            ("expediture-0-id", &id),
            ("expediture-1-id", &id),
        ]);
        assert!(matches!(
            Formset::<ExpeditureForm>::bind(FormsetOptions::EDIT, vec![item], &d),
            Err(ManagementError::DuplicateItem { index: 1, .. })
        ));
    }

    #[test]
    fn unbound_view_lists_items_then_extra_rows() {
        let ticket = TicketId::new();
        let item = MediaInfo::new(ticket, "photos", None, Some(12));
        let view = Formset::<MediaForm>::unbound(FormsetOptions::EDIT, vec![item.clone()]).view();
        assert_eq!(view.prefix, "mediainfo");
        assert_eq!(view.management.total_forms, 2);
        assert_eq!(view.management.initial_forms, 1);
        assert!(view.can_delete);
        assert_eq!(view.forms[0].id, Some(item.id.to_string()));
        assert_eq!(view.forms[0].values["count"], "12");
        assert_eq!(view.forms[1].prefix, "mediainfo-1");

        let create = Formset::<MediaForm>::unbound(FormsetOptions::CREATE, vec![]).view();
        assert_eq!(create.management.total_forms, 2);
        assert!(!create.can_delete);
    }

    #[test]
    fn bound_view_adds_one_blank_row() {
        let d = data(&[
            ("mediainfo-TOTAL_FORMS", "2"),
            ("mediainfo-INITIAL_FORMS", "0"),
            ("mediainfo-0-description", "photos"),
            ("mediainfo-0-count", "-3"),
        ]);
        let formset = Formset::<MediaForm>::bind(FormsetOptions::CREATE, vec![], &d).unwrap();
        assert!(!formset.is_valid());
        let view = formset.view();
        assert_eq!(view.management.total_forms, 3);
        assert_eq!(view.forms.len(), 3);
        assert!(view.forms[0].errors.has("count"));
        assert_eq!(view.forms[0].values["description"], "photos");
    }

    #[test]
    fn skipped_formset_keeps_values_but_drops_errors() {
        let d = data(&[
            ("mediainfo-TOTAL_FORMS", "1"),
            ("mediainfo-INITIAL_FORMS", "0"),
            ("mediainfo-0-description", "photos"),
            ("mediainfo-0-count", "many"),
        ]);
        let formset = Formset::<MediaForm>::bind(FormsetOptions::CREATE, vec![], &d)
            .unwrap()
            .skip_validation();
        let view = formset.view();
        assert!(view.forms[0].errors.is_empty());
        assert_eq!(view.forms[0].values["count"], "many");
        assert!(formset.into_changes(TicketId::new()).is_empty());
    }

    #[test]
    fn serialized_management_uses_wire_names() {
        let view = Formset::<MediaForm>::unbound(FormsetOptions::CREATE, vec![]).view();
        let json = serde_json::to_value(&view.management).unwrap();
        assert_eq!(json["TOTAL_FORMS"], 2);
        assert_eq!(json["MAX_NUM_FORMS"], 1000);
    }
}
