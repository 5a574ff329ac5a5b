//! Form validation for the catalog controllers.
//!
//! Incoming fields go through an ordered [`RuleSet`] (trim, check, escape),
//! then a typed terminal builder turns the sanitized values into the entity's
//! `New*` struct. Failures never escape as errors: they come back as a
//! [`Rejected`] carrying the sanitized input and the ordered messages so the
//! form can be shown again.

pub mod form;
pub mod rules;
pub mod schemas;

pub use form::{FieldValue, FormData, FormValues};
pub use rules::{escape_html, parse_iso_date, FieldError, FieldRule, RuleSet, Sanitized, Step};
pub use schemas::{AuthorForm, BookForm, BookInstanceForm, GenreForm};

/// Rule set and builder for one entity's form.
pub trait FormSchema {
    /// What a valid submission produces.
    type Output;
    /// The persisted entity an update form is pre-filled from.
    type Entity;

    fn rules() -> RuleSet;

    /// Build the typed output from values that passed every rule.
    fn build(values: &Sanitized) -> Result<Self::Output, Vec<FieldError>>;

    /// Form values describing an existing entity.
    fn values_from(entity: &Self::Entity) -> FormValues;
}

/// A submission that failed validation.
#[derive(Debug, Clone, Default)]
pub struct Rejected {
    pub values: FormValues,
    pub errors: Vec<FieldError>,
}

/// Run `S`'s pipeline over `form`.
pub fn validate<S: FormSchema>(form: &FormData) -> Result<S::Output, Rejected> {
    let sanitized = S::rules().apply(form);
    if !sanitized.is_valid() {
        return Err(Rejected {
            values: sanitized.values,
            errors: sanitized.errors,
        });
    }
    S::build(&sanitized).map_err(|errors| Rejected {
        values: sanitized.values.clone(),
        errors,
    })
}
