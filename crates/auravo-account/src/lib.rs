//! Auravo Account crate - the signed-in profile and the contact form.
//!
//! Identity and media hosting sit behind the [`AuthProvider`] and
//! [`MediaUploader`] traits; the local implementations keep everything
//! under the data directory.

pub mod contact;
pub mod error;
pub mod profile;
pub mod upload;

pub use contact::{submit_contact_form, ContactForm, ContactReceipt};
pub use error::AccountError;
pub use profile::{
    AuthProvider, LocalAuthProvider, ProfileForm, ProfileService, ProfileUpdate, UserProfile,
};
pub use upload::{LocalMediaStore, MediaUploader};
