//! Static markup and scripts injected into the preview frame.

use regex::Regex;
use std::sync::LazyLock;

static SCRIPT_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</(script)").expect("valid regex"));

static STYLE_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</(style)").expect("valid regex"));

/// Returns the preview page skeleton around `head` and `body` markup.
pub fn page(head: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8" />
<meta name="viewport" content="width=device-width, initial-scale=1" />
<title>Preview</title>
<style>{base}</style>
{head}
</head>
<body>
<div id="root"></div>
{body}
</body>
</html>
"#,
        base = base_styles(),
    )
}

/// Returns the styles for the error box and placeholders the shim renders.
pub fn base_styles() -> &'static str {
    r#"
.appforge-error { margin: 12px; padding: 12px 16px; border: 1px solid #f5c2c7; border-radius: 6px;
  background: #fff5f5; color: #842029; font: 12px/1.5 ui-monospace, SFMono-Regular, Menlo, monospace;
  white-space: pre-wrap; }
.appforge-missing { display: inline-block; padding: 0 4px; border: 1px dashed #adb5bd; border-radius: 3px;
  color: #6c757d; font: 11px ui-monospace, monospace; }
"#
}

/// Returns a `<script src>` tag.
pub fn external_script(url: &str) -> String {
    format!(r#"<script crossorigin src="{}"></script>"#, escape_attribute(url))
}

/// Returns an inline classic script tag.
pub fn inline_script(code: &str) -> String {
    format!("<script>\n{}\n</script>", escape_script(code))
}

/// Returns an inline style tag.
pub fn inline_style(css: &str) -> String {
    format!("<style>\n{}\n</style>", STYLE_CLOSE.replace_all(css, "<\\/$1"))
}

/// Returns the deferred source tag the single-file runner reads.
pub fn babel_source(id: &str, filename: &str, source: &str) -> String {
    format!(
        r#"<script type="text/babel" id="{}" data-filename="{}">
{}
</script>"#,
        escape_attribute(id),
        escape_attribute(filename),
        escape_script(source)
    )
}

/// Returns the script that mounts `App` once every module had `delay_ms` to register.
pub fn mount_script(delay_ms: u64) -> String {
    format!("window.__appforge.mount({delay_ms});")
}

/// Returns the script that transpiles and runs the single-file entry in the frame.
pub fn single_file_runner(id: &str, filename: &str) -> String {
    let id = serde_json::to_string(id).unwrap_or_default();
    let filename = serde_json::to_string(filename).unwrap_or_default();
    format!("window.__appforge.runSingle({id}, {filename});")
}

/// Returns the `<iframe>` element carrying `document` in `srcdoc`.
pub fn frame(document: &str) -> String {
    format!(
        r#"<iframe sandbox="allow-scripts" title="Preview" style="width:100%;height:100%;border:0" srcdoc="{}"></iframe>"#,
        escape_attribute(document)
    )
}

/// Keep script bodies from closing their own tag.
pub fn escape_script(code: &str) -> String {
    SCRIPT_CLOSE.replace_all(code, "<\\/$1").replace("<!--", "<\\!--")
}

pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Returns the runtime every preview document starts with: the component
/// registry, module resolution, placeholders, a minimal router, the error
/// boundary and the mount entry points.
pub fn shim_runtime() -> &'static str {
    r##"(function () {
  'use strict';
  var forge = window.__appforge = window.__appforge || {};
  forge.components = {};
  forge.aliases = forge.aliases || {};
  forge.errors = [];

  var h = React.createElement;
  window.h = h;
  window.Fragment = React.Fragment;

  function describe(error) {
    if (error && error.stack) return String(error.stack);
    if (error && error.message) return String(error.message);
    return String(error);
  }

  function errorBox(source, error) {
    var root = document.getElementById('root');
    if (!root) return;
    var box = document.createElement('pre');
    box.className = 'appforge-error';
    box.textContent = source + '\n' + describe(error);
    root.appendChild(box);
  }

  forge.showError = function (source, error) {
    forge.errors.push({ source: source, message: describe(error) });
    console.error('[preview] ' + source, error);
    errorBox(source, error);
  };

  window.addEventListener('error', function (event) {
    forge.showError('runtime', event.error || event.message);
  });
  window.addEventListener('unhandledrejection', function (event) {
    forge.showError('unhandled promise', event.reason);
  });

  // Registry

  forge.register = function (name, value) {
    if (value !== undefined) forge.components[name] = value;
  };

  function moduleKey(specifier) {
    return String(specifier)
      .replace(/^[@~]\//, '')
      .replace(/^(\.\.?\/)+/, '')
      .replace(/^\/+/, '')
      .replace(/^src\//, '')
      .replace(/\.(tsx|ts|jsx|js)$/, '')
      .replace(/\/index$/, '');
  }

  function aliasFor(key) {
    if (Object.prototype.hasOwnProperty.call(forge.aliases, key)) return forge.aliases[key];
    for (var candidate in forge.aliases) {
      if (candidate.slice(-(key.length + 1)) === '/' + key) return forge.aliases[candidate];
    }
    return key.split('/').pop();
  }

  function lookup(specifier, name) {
    if (name) return name === 'default' ? forge.components[aliasFor(moduleKey(specifier))] : forge.components[name];
    return forge.components[aliasFor(moduleKey(specifier))];
  }

  function placeholder(label) {
    return h('span', { className: 'appforge-missing', title: label }, label);
  }

  forge.resolve = function (specifier, name) {
    var found = lookup(specifier, name);
    if (found !== undefined) return found;
    var label = name ? name + ' from ' + specifier : specifier;
    // Resolved again on every call so modules registered later are found
    return function Deferred(props) {
      var target = lookup(specifier, name);
      if (target === undefined) return placeholder('Missing: ' + label);
      if (typeof target !== 'function') return target;
      if (target.prototype && target.prototype.isReactComponent) return h(target, props);
      return target.apply(this, arguments);
    };
  };

  var REACT_STATICS = ['$$typeof', 'defaultProps', 'propTypes', 'contextTypes', 'childContextTypes',
    'contextType', 'displayName', 'getDerivedStateFromProps', 'render', 'compare', 'then', 'toJSON'];

  forge.missing = function (pkg) {
    function Missing() {
      return placeholder('[' + pkg + ']');
    }
    return new Proxy(Missing, {
      get: function (target, prop) {
        if (prop in target || typeof prop !== 'string' || REACT_STATICS.indexOf(prop) !== -1) return target[prop];
        if (/^use[A-Z]/.test(prop)) return function () { return {}; };
        return /^[A-Z]/.test(prop) ? Missing : undefined;
      }
    });
  };

  var iconCache = {};
  function icon(name) {
    function Icon(props) {
      props = props || {};
      var size = props.size || 24;
      return h('svg', {
        width: size, height: size, viewBox: '0 0 24 24', fill: 'none',
        stroke: props.color || 'currentColor', strokeWidth: props.strokeWidth || 2,
        className: props.className, style: props.style, 'data-icon': name
      }, h('rect', { x: 3, y: 3, width: 18, height: 18, rx: 5 }));
    }
    Icon.displayName = name;
    return Icon;
  }
  forge.icons = new Proxy({}, {
    get: function (target, name) {
      if (typeof name !== 'string' || REACT_STATICS.indexOf(name) !== -1) return undefined;
      return iconCache[name] || (iconCache[name] = icon(name));
    }
  });

  // Router

  var current = { pathname: '/', search: '', hash: '', state: null, key: 'default' };
  var history = [current];
  var listeners = [];

  function parsePath(to) {
    var path = String(to);
    var hash = '';
    var search = '';
    var hashAt = path.indexOf('#');
    if (hashAt !== -1) { hash = path.slice(hashAt); path = path.slice(0, hashAt); }
    var searchAt = path.indexOf('?');
    if (searchAt !== -1) { search = path.slice(searchAt); path = path.slice(0, searchAt); }
    if (path.charAt(0) !== '/') {
      var base = current.pathname.replace(/\/[^\/]*$/, '');
      path = base + '/' + path;
    }
    var segments = [];
    path.split('/').forEach(function (segment) {
      if (segment === '..') segments.pop();
      else if (segment && segment !== '.') segments.push(segment);
    });
    return { pathname: '/' + segments.join('/'), search: search, hash: hash };
  }

  function navigate(to, options) {
    if (typeof to === 'number') {
      var index = Math.max(0, Math.min(history.length - 1, history.indexOf(current) + to));
      current = history[index];
    } else {
      var next = parsePath(to);
      next.state = options && options.state !== undefined ? options.state : null;
      next.key = Math.random().toString(36).slice(2);
      if (options && options.replace) history[history.indexOf(current)] = next;
      else history.splice(history.indexOf(current) + 1, history.length, next);
      current = next;
    }
    listeners.slice().forEach(function (listener) { listener(current); });
  }

  function matchPath(pattern, pathname) {
    if (pattern === undefined || pattern === null || pattern === '*') return {};
    var keys = [];
    var source = String(pattern).replace(/\/+$/, '').split('/').map(function (segment) {
      if (segment === '*') { keys.push('*'); return '(.*)'; }
      if (segment.charAt(0) === ':') { keys.push(segment.slice(1).replace(/\?$/, '')); return '([^/]+)'; }
      return segment.replace(/[.*+?^${}()|[\]\\]/g, '\\$&');
    }).join('/');
    var match = new RegExp('^' + source + '/?$').exec(pathname);
    if (!match) return null;
    var params = {};
    keys.forEach(function (key, i) { params[key] = decodeURIComponent(match[i + 1] || ''); });
    return params;
  }

  var ParamsContext = React.createContext({});

  function useLocation() {
    var state = React.useState(current);
    React.useEffect(function () {
      var listener = function (location) { state[1](location); };
      listeners.push(listener);
      return function () { listeners.splice(listeners.indexOf(listener), 1); };
    }, []);
    return state[0];
  }

  function useNavigate() {
    return navigate;
  }

  function useParams() {
    return React.useContext(ParamsContext);
  }

  function useSearchParams() {
    var location = useLocation();
    return [new URLSearchParams(location.search), function (next) {
      navigate(location.pathname + '?' + new URLSearchParams(next).toString());
    }];
  }

  function renderRoute(route) {
    if (route.element !== undefined) return route.element;
    var component = route.component || route.Component;
    if (component) return h(component, {});
    if (typeof route.render === 'function') return route.render({});
    return route.children === undefined ? null : route.children;
  }

  function routeParams(route, pathname) {
    if (route.index) return pathname === '/' ? {} : null;
    return matchPath(route.path, pathname);
  }

  function Routes(props) {
    var location = useLocation();
    var routes = React.Children.toArray(props.children);
    for (var i = 0; i < routes.length; i++) {
      var route = routes[i].props || {};
      var params = routeParams(route, location.pathname);
      if (params) return h(ParamsContext.Provider, { value: params }, renderRoute(route));
    }
    return null;
  }

  function Route(props) {
    var location = useLocation();
    var params = routeParams(props, location.pathname);
    return params ? h(ParamsContext.Provider, { value: params }, renderRoute(props)) : null;
  }

  function Passthrough(props) {
    return h(React.Fragment, null, props.children);
  }

  function linkProps(props, active) {
    var rest = {};
    for (var key in props) {
      if (key !== 'to' && key !== 'replace' && key !== 'state' && key !== 'end') rest[key] = props[key];
    }
    if (typeof rest.className === 'function') rest.className = rest.className({ isActive: active });
    if (typeof rest.style === 'function') rest.style = rest.style({ isActive: active });
    if (typeof rest.children === 'function') rest.children = rest.children({ isActive: active });
    rest.href = props.to;
    rest.onClick = function (event) {
      if (props.onClick) props.onClick(event);
      if (event.defaultPrevented) return;
      event.preventDefault();
      navigate(props.to, { replace: props.replace, state: props.state });
    };
    return rest;
  }

  function Link(props) {
    return h('a', linkProps(props, false));
  }

  function NavLink(props) {
    var location = useLocation();
    var target = parsePath(props.to).pathname;
    var active = props.end ? location.pathname === target : location.pathname.indexOf(target) === 0;
    return h('a', linkProps(props, active));
  }

  function Navigate(props) {
    React.useEffect(function () { navigate(props.to, { replace: props.replace, state: props.state }); }, [props.to]);
    return null;
  }

  function Outlet() {
    return null;
  }

  forge.router = {
    BrowserRouter: Passthrough, HashRouter: Passthrough, MemoryRouter: Passthrough, Router: Passthrough,
    Routes: Routes, Switch: Routes, Route: Route, Link: Link, NavLink: NavLink, Navigate: Navigate,
    Redirect: Navigate, Outlet: Outlet, useNavigate: useNavigate, useHistory: function () {
      return { push: navigate, replace: function (to) { navigate(to, { replace: true }); }, goBack: function () { navigate(-1); } };
    }, useLocation: useLocation, useParams: useParams, useSearchParams: useSearchParams, matchPath: matchPath
  };
  window.__Route = Route;

  // Mounting

  function ErrorBoundary(props) {
    React.Component.call(this, props);
    this.state = { error: null };
  }
  ErrorBoundary.prototype = Object.create(React.Component.prototype);
  ErrorBoundary.prototype.constructor = ErrorBoundary;
  ErrorBoundary.getDerivedStateFromError = function (error) {
    return { error: error };
  };
  ErrorBoundary.prototype.componentDidCatch = function (error) {
    forge.errors.push({ source: 'render', message: describe(error) });
    console.error('[preview] render', error);
  };
  ErrorBoundary.prototype.render = function () {
    if (this.state.error) return h('pre', { className: 'appforge-error' }, 'render\n' + describe(this.state.error));
    return this.props.children;
  };
  forge.ErrorBoundary = ErrorBoundary;

  forge.mount = function (delay) {
    setTimeout(function () {
      var App = forge.components.App || forge.components[forge.aliases.App];
      if (!App) {
        forge.showError('mount', new Error('No App component was registered. Export a default App component to see a preview.'));
        return;
      }
      var root = document.getElementById('root');
      var element = h(ErrorBoundary, null, h(App, null));
      try {
        if (ReactDOM.createRoot) ReactDOM.createRoot(root).render(element);
        else ReactDOM.render(element, root);
      } catch (error) {
        forge.showError('mount', error);
      }
    }, delay);
  };

  forge.runSingle = function (id, filename) {
    var node = document.getElementById(id);
    if (!node) return;
    try {
      var code = window.Babel.transform(node.textContent, {
        filename: filename,
        presets: [['typescript', { isTSX: true, allExtensions: true }], 'react']
      }).code;
      new Function(code + '\n;if (typeof App !== "undefined") window.__appforge.register("App", App);')();
    } catch (error) {
      forge.showError(filename, error);
    }
  };

  if (window.Babel && window.Babel.disableScriptTags) window.Babel.disableScriptTags();
})();
"##
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_attribute() {
        assert_eq!(
            escape_attribute(r#"<p class="a">Tom & 'Jerry'</p>"#),
            "&lt;p class=&quot;a&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/p&gt;"
        );
    }

    #[test]
    fn test_inline_script_cannot_close_itself() {
        let tag = inline_script("const s = '</script><script>alert(1)</script>';");
        assert_eq!(tag.matches("</script").count(), 1);
        assert!(tag.ends_with("</script>"));
    }

    #[test]
    fn test_script_close_is_escaped_in_any_case() {
        let escaped = escape_script("a('</SCRIPT>'); b('</Script >');");
        assert_eq!(escaped, "a('<\\/SCRIPT>'); b('<\\/Script >');");
    }

    #[test]
    fn test_style_close_is_escaped_in_any_case() {
        let tag = inline_style(".a::after { content: '</STYLE>'; }\n.b::after { content: '</style>'; }");
        assert_eq!(tag.to_ascii_lowercase().matches("</style").count(), 1);
        assert!(tag.contains("'<\\/STYLE>'"));
        assert!(tag.ends_with("</style>"));
    }

    #[test]
    fn test_frame_wraps_document() {
        let frame = frame("<html>\"x\"</html>");
        assert!(frame.starts_with(r#"<iframe sandbox="allow-scripts""#));
        assert!(frame.contains(r#"srcdoc="&lt;html&gt;&quot;x&quot;&lt;/html&gt;""#));
    }

    #[test]
    fn test_runtime_exposes_entry_points() {
        let runtime = shim_runtime();
        for name in [
            "forge.register",
            "forge.resolve",
            "forge.missing",
            "forge.showError",
            "forge.mount",
            "forge.runSingle",
            "useNavigate: useNavigate",
            "useParams: useParams",
            "useLocation: useLocation",
            "'unhandledrejection'",
        ] {
            assert!(runtime.contains(name), "runtime is missing {name}");
        }
    }
}
