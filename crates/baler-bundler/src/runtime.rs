//! The runtime module: source index 0 of every bundle.
//!
//! Parsed exactly like user code. `__commonJS` lazily evaluates a wrapped
//! CommonJS module body, `__toModule` adapts a CommonJS exports object for
//! ES-module-style access, and `__export` installs getters for a namespace
//! object. Helpers are pulled into the output on demand.

pub use baler_resolver::resolver::RUNTIME_PATH;

pub const SOURCE: &str = r#"export var __commonJS = (callback, module) => () => {
  if (!module) {
    module = { exports: {} };
    callback(module.exports, module);
  }
  return module.exports;
};
export var __toModule = (module) => {
  if (module && module.__esModule) {
    return module;
  }
  var result = { default: module };
  for (var key in module) {
    result[key] = module[key];
  }
  return result;
};
export var __export = (target, all) => {
  for (var name in all) {
    Object.defineProperty(target, name, { get: all[name], enumerable: true });
  }
};
"#;
