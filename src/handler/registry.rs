//! Identifier-to-factory mapping used to construct handlers on demand.

// self
use crate::{_prelude::*, auth::MethodName, handler::ApiHandler};

/// Zero-argument constructor for a handler instance.
pub type HandlerFactory = Arc<dyn Fn() -> Box<dyn ApiHandler> + Send + Sync>;

/// Registry of API methods.
///
/// Only the factory named by an incoming request runs, so unrelated handlers cost nothing per
/// dispatch.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
	factories: HashMap<MethodName, HandlerFactory>,
}
impl HandlerRegistry {
	/// Creates an empty registry.
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers (or replaces) the factory for `method`.
	pub fn register<H, F>(&mut self, method: MethodName, factory: F) -> &mut Self
	where
		H: 'static + ApiHandler,
		F: 'static + Send + Sync + Fn() -> H,
	{
		let erased: HandlerFactory =
			Arc::new(move || -> Box<dyn ApiHandler> { Box::new(factory()) });

		self.factories.insert(method, erased);

		self
	}

	/// Builder-style variant of [`HandlerRegistry::register`].
	pub fn with_handler<H, F>(mut self, method: MethodName, factory: F) -> Self
	where
		H: 'static + ApiHandler,
		F: 'static + Send + Sync + Fn() -> H,
	{
		self.register(method, factory);

		self
	}

	/// Looks up the registered key and factory for a raw header value.
	pub fn resolve(&self, method: &str) -> Option<(&MethodName, &HandlerFactory)> {
		self.factories.get_key_value(method)
	}
}
impl Debug for HandlerRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let mut methods: Vec<&str> = self.factories.keys().map(|method| method.as_ref()).collect();

		methods.sort_unstable();

		f.debug_struct("HandlerRegistry").field("methods", &methods).finish()
	}
}
