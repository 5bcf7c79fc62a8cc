use tracing::trace;

use crate::{
    ComposedSchema, Document, ModelInstance, ValidateOptions, ValidationFailure, reconcile,
    reconstruct, validate,
};

/// Validates a flat document and builds its instance graph.
///
/// Runs [`validate`], then [`reconstruct`], then [`reconcile`] unless
/// `options.reconcile` is off.
///
/// # Errors
///
/// Returns the [`ValidationFailure`] from validation; the later stages
/// cannot fail.
pub fn validate_and_build(
    schema: &ComposedSchema,
    document: &Document,
    options: &ValidateOptions,
) -> Result<ModelInstance, ValidationFailure> {
    let validated = validate(schema, document, options)?;
    let instance = reconstruct(schema, validated);
    trace!(model = %schema.name(), reconcile = options.reconcile, "built instance");
    if options.reconcile {
        Ok(reconcile(instance))
    } else {
        Ok(instance)
    }
}
