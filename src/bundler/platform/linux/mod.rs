//! Linux package formats.
//!
//! - [`Debian`] - `.deb` via debuild for Debian and Ubuntu
//! - [`Rpm`] - `.rpm` via rpmbuild for EL, Fedora, SLES and Amazon Linux
//!
//! Both expect the packaging metadata (`debian/` or `<name>.spec`) to have been
//! rendered next to the source tarball before the plan runs.

mod debian;
mod rpm;

pub use debian::Debian;
pub use rpm::Rpm;
