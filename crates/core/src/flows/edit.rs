use serde::{Deserialize, Serialize};

use crate::domain::product::{Product, ProductId, DEFAULT_QUANTITY};
use crate::flows::engine::FlowTransitionError;

/// A local copy of one product being edited.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditDraft {
    pub product_id: ProductId,
    pub original: Product,
    pub draft: Product,
}

impl EditDraft {
    pub fn is_dirty(&self) -> bool {
        self.draft != self.original
    }
}

/// The single product-edit slot. At most one product is edited at a time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditSlot {
    active: Option<EditDraft>,
}

impl EditSlot {
    pub fn active(&self) -> Option<&EditDraft> {
        self.active.as_ref()
    }

    pub fn editing_id(&self) -> Option<&ProductId> {
        self.active.as_ref().map(|edit| &edit.product_id)
    }

    /// Opens `product` for editing and returns the draft it displaced, if any.
    ///
    /// A displaced draft with unsaved changes is only given up when
    /// `discard_unsaved` is set; otherwise the call fails and the slot is kept.
    pub fn begin(
        &mut self,
        product: &Product,
        discard_unsaved: bool,
    ) -> Result<Option<EditDraft>, FlowTransitionError> {
        if let Some(active) = &self.active {
            if active.product_id == product.id {
                return Ok(None);
            }
            if active.is_dirty() && !discard_unsaved {
                return Err(FlowTransitionError::UnsavedEdit {
                    product_id: active.product_id.clone(),
                });
            }
        }

        Ok(self.active.replace(EditDraft {
            product_id: product.id.clone(),
            original: product.clone(),
            draft: product.clone(),
        }))
    }

    pub fn update(&mut self, mut product: Product) -> Result<(), FlowTransitionError> {
        let active = self.active.as_mut().ok_or(FlowTransitionError::NoActiveEdit)?;
        product.id = active.product_id.clone();
        active.draft = product;
        Ok(())
    }

    pub fn cancel(&mut self) -> Option<EditDraft> {
        self.active.take()
    }

    /// Closes the slot if it holds `product_id`.
    pub fn release(&mut self, product_id: &ProductId) {
        if self.editing_id() == Some(product_id) {
            self.active = None;
        }
    }
}

/// Replaces the product with `product_id` by `updated`, leaving every other
/// entry untouched. The stored record keeps `product_id` as its id.
pub fn save_edit(
    products: &mut [Product],
    product_id: &ProductId,
    mut updated: Product,
) -> Result<(), FlowTransitionError> {
    let slot = products
        .iter_mut()
        .find(|product| &product.id == product_id)
        .ok_or_else(|| FlowTransitionError::ProductNotFound { product_id: product_id.clone() })?;

    updated.id = product_id.clone();
    if updated.quantity == 0 {
        updated.quantity = DEFAULT_QUANTITY;
    }
    *slot = updated;
    Ok(())
}
