pub mod non_ascii;

use super::registry::CopRegistry;

pub fn register_all(registry: &mut CopRegistry) {
    registry.register(Box::new(non_ascii::NonAscii));
}
