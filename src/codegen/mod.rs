pub mod builtins;
pub mod runtime;

use std::collections::HashMap;

use crate::parser::ast::*;

/// Lower a parsed program to C++ source text. Generation is syntax-directed
/// and cannot fail: structurally valid trees always produce output, and any
/// semantic nonsense is left for the native compiler to reject.
pub fn generate(program: &Program) -> String {
    Generator::new().generate(program)
}

pub struct Generator {
    out: String,
    indent: usize,
    structs: HashMap<String, StructDecl>,
    methods: HashMap<String, Vec<MethodDecl>>,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
            structs: HashMap::new(),
            methods: HashMap::new(),
        }
    }

    pub fn generate(mut self, program: &Program) -> String {
        // First pass: index type declarations and the methods bound to them
        // by name, so declaration order in the source does not matter.
        for stmt in &program.statements {
            match stmt {
                Stmt::Struct(s) => {
                    self.structs.insert(s.name.clone(), s.clone());
                }
                Stmt::Method(m) => {
                    self.methods.entry(m.struct_name.clone()).or_default().push(m.clone());
                }
                _ => {}
            }
        }

        for include in runtime::INCLUDES {
            self.line(include);
        }
        self.blank();

        // Second pass: types first (each carrying its methods), then
        // functions, decorated functions, and tests, in source order.
        for stmt in &program.statements {
            if let Stmt::Struct(s) = stmt {
                self.gen_struct(s);
            }
        }

        for stmt in &program.statements {
            match stmt {
                Stmt::Function(f) => self.gen_function(f),
                Stmt::Decorator { name, function } => self.gen_decorator(name, function),
                Stmt::Test { name, body } => self.gen_test(name, body),
                Stmt::Method(m) if !self.structs.contains_key(&m.struct_name) => {
                    // A method naming a type that is never declared still
                    // emits, as a free function carrying its name.
                    self.gen_orphan_method(m);
                }
                _ => {}
            }
        }

        self.out
    }

    // ── Declarations ─────────────────────────────────────────────────

    fn gen_struct(&mut self, s: &StructDecl) {
        self.line(&format!("struct {} {{", s.name));
        self.indent += 1;

        for field in &s.fields {
            let ty = cpp_type(&field.ty);
            self.line(&format!("{} {};", ty, field.name));
        }

        if let Some(methods) = self.methods.get(&s.name).cloned() {
            self.blank();
            for m in &methods {
                self.gen_method(m);
            }
        }

        self.indent -= 1;
        self.line("};");
        self.blank();
    }

    fn gen_method(&mut self, m: &MethodDecl) {
        self.line(&format!("void {}() {{", m.name));
        self.indent += 1;
        for stmt in &m.body {
            self.gen_stmt(stmt);
        }
        self.indent -= 1;
        self.line("}");
    }

    fn gen_orphan_method(&mut self, m: &MethodDecl) {
        self.gen_method(m);
        self.blank();
    }

    fn gen_function(&mut self, f: &Function) {
        let is_generator = has_yield(&f.body);

        if f.name == "start" {
            self.line("int main() {");
        } else if is_generator {
            // Generator: yielded values accumulate into a vector that
            // replaces the normal return value.
            let params = gen_params(&f.params);
            self.line(&format!("auto {}({}) {{", f.name, params));
            self.indent += 1;
            self.line("std::vector<int> _result;");
            self.line("auto _yield = [&](auto v) { _result.push_back(v); };");
            self.indent -= 1;
        } else {
            let params = gen_params(&f.params);
            self.line(&format!("auto {}({}) {{", f.name, params));
        }
        self.indent += 1;

        for stmt in &f.body {
            self.gen_stmt(stmt);
        }

        if f.name == "start" {
            self.line("return 0;");
        } else if is_generator {
            self.line("return _result;");
        }
        self.indent -= 1;
        self.line("}");
        self.blank();
    }

    fn gen_decorator(&mut self, decorator: &str, f: &Function) {
        let impl_name = format!("_{}_impl", f.name);

        let mut impl_fn = f.clone();
        impl_fn.name = impl_name.clone();
        self.gen_function(&impl_fn);

        // Wrapper: forwards the original parameters to the implementation and
        // hands its result to the decorator.
        let params = gen_params(&f.params);
        let names = f.params.join(", ");

        self.line(&format!("auto {}({}) {{", f.name, params));
        self.indent += 1;
        if f.params.is_empty() {
            self.line(&format!("return {}({}());", decorator, impl_name));
        } else {
            self.line(&format!("return {}({}({}));", decorator, impl_name, names));
        }
        self.indent -= 1;
        self.line("}");
        self.blank();
    }

    fn gen_test(&mut self, name: &str, body: &[Stmt]) {
        let display = if name.is_empty() { "unnamed_test" } else { name };
        let fn_name = display.replace(' ', "_");

        self.line(&format!("void test_{}() {{", fn_name));
        self.indent += 1;
        self.line(&format!("std::cout << \"Running test: {}\" << std::endl;", display));
        for stmt in body {
            self.gen_stmt(stmt);
        }
        self.line(&format!("std::cout << \"Test passed: {}\" << std::endl;", display));
        self.indent -= 1;
        self.line("}");
        self.blank();
    }

    // ── Statements ───────────────────────────────────────────────────

    fn gen_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::If { condition, then_body, else_ifs, else_body } => {
                self.line(&format!("if ({}) {{", self.gen_expr(condition)));
                self.indent += 1;
                for s in then_body {
                    self.gen_stmt(s);
                }
                self.indent -= 1;

                for elif in else_ifs {
                    self.line(&format!("}} else if ({}) {{", self.gen_expr(&elif.condition)));
                    self.indent += 1;
                    for s in &elif.body {
                        self.gen_stmt(s);
                    }
                    self.indent -= 1;
                }

                if !else_body.is_empty() {
                    self.line("} else {");
                    self.indent += 1;
                    for s in else_body {
                        self.gen_stmt(s);
                    }
                    self.indent -= 1;
                }
                self.line("}");
            }
            Stmt::ForEach { var, start, end, body } => {
                match end {
                    Some(end) => {
                        let start = self.gen_expr(start);
                        let end = self.gen_expr(end);
                        self.line(&format!(
                            "for (int {var} = {start}; {var} <= {end}; {var}++) {{"
                        ));
                    }
                    None => {
                        let collection = self.gen_expr(start);
                        self.line(&format!("for (const auto& {var} : {collection}) {{"));
                    }
                }
                self.indent += 1;
                for s in body {
                    self.gen_stmt(s);
                }
                self.indent -= 1;
                self.line("}");
            }
            Stmt::Repeat { count, body } => {
                self.line(&format!("for (int _i = 0; _i < {count}; _i++) {{"));
                self.indent += 1;
                for s in body {
                    self.gen_stmt(s);
                }
                self.indent -= 1;
                self.line("}");
            }
            Stmt::While { condition, body } => {
                self.line(&format!("while ({}) {{", self.gen_expr(condition)));
                self.indent += 1;
                for s in body {
                    self.gen_stmt(s);
                }
                self.indent -= 1;
                self.line("}");
            }
            Stmt::Return(value) => match value {
                Some(v) => {
                    let v = self.gen_expr(v);
                    self.line(&format!("return {v};"));
                }
                None => self.line("return;"),
            },
            Stmt::Say(v) => {
                let v = self.gen_expr(v);
                self.line(&format!("std::cout << {v} << std::endl;"));
            }
            Stmt::Print(v) => {
                let v = self.gen_expr(v);
                self.line(&format!("std::cout << {v} << std::flush;"));
            }
            Stmt::Pause(ms) => {
                let ms = self.gen_expr(ms);
                self.line(&format!(
                    "std::this_thread::sleep_for(std::chrono::milliseconds({ms}));"
                ));
            }
            Stmt::Assign { name, value, mutable } => {
                let value = self.gen_expr(value);
                if *mutable {
                    self.line(&format!("auto {name} = {value};"));
                } else {
                    self.line(&format!("const auto {name} = {value};"));
                }
            }
            Stmt::Reassign { name, value } => {
                let value = self.gen_expr(value);
                self.line(&format!("{name} = {value};"));
            }
            Stmt::Unpack { names, value, mutable } => {
                let names = names.join(", ");
                let value = self.gen_expr(value);
                if *mutable {
                    self.line(&format!("auto [{names}] = {value};"));
                } else {
                    self.line(&format!("const auto [{names}] = {value};"));
                }
            }
            Stmt::Skip => self.line("continue;"),
            Stmt::Stop => self.line("break;"),
            Stmt::WriteFile { content, path, append } => {
                let path = self.gen_expr(path);
                let content = self.gen_expr(content);
                if *append {
                    self.line(&format!(
                        "{{ std::ofstream _f({path}, std::ios::app); _f << {content}; }}"
                    ));
                } else {
                    self.line(&format!("{{ std::ofstream _f({path}); _f << {content}; }}"));
                }
            }
            Stmt::Using { name, value, body } => {
                let value = self.gen_expr(value);
                self.line(&format!("{{ auto {name} = {value};"));
                self.indent += 1;
                for s in body {
                    self.gen_stmt(s);
                }
                self.indent -= 1;
                self.line("}");
            }
            Stmt::Yield(v) => {
                let v = self.gen_expr(v);
                self.line(&format!("_yield({v});"));
            }
            Stmt::Log { level, message } => {
                let message = self.gen_expr(message);
                self.line(&format!(
                    "{{ auto _now = std::chrono::system_clock::now(); auto _time = std::chrono::system_clock::to_time_t(_now); std::cerr << std::put_time(std::localtime(&_time), \"%Y-%m-%d %H:%M:%S\") << \" {} \" << {} << std::endl; }}",
                    level.label(),
                    message
                ));
            }
            Stmt::Assert { condition, message } => {
                let cond = self.gen_expr(condition);
                match message {
                    Some(m) => {
                        let m = self.gen_expr(m);
                        self.line(&format!(
                            "if (!({cond})) {{ std::cerr << \"Assertion failed: \" << {m} << std::endl; std::abort(); }}"
                        ));
                    }
                    None => {
                        self.line(&format!(
                            "if (!({cond})) {{ std::cerr << \"Assertion failed: {cond}\" << std::endl; std::abort(); }}"
                        ));
                    }
                }
            }
            Stmt::Try { body, err_name, catch_body } => {
                self.line("try {");
                self.indent += 1;
                for s in body {
                    self.gen_stmt(s);
                }
                self.indent -= 1;
                self.line(&format!("}} catch (const std::exception& {err_name}) {{"));
                self.indent += 1;
                for s in catch_body {
                    self.gen_stmt(s);
                }
                self.indent -= 1;
                self.line("}");
            }
            Stmt::Throw(message) => {
                let message = self.gen_expr(message);
                self.line(&format!("throw std::runtime_error({message});"));
            }
            Stmt::DoTogether(body) => {
                // One worker per child statement. Workers copy-capture their
                // environment so they cannot race on shared locals.
                self.line("{");
                self.indent += 1;
                self.line("std::vector<std::thread> _threads;");
                for s in body {
                    self.line("_threads.emplace_back([=]() mutable {");
                    self.indent += 1;
                    self.gen_stmt(s);
                    self.indent -= 1;
                    self.line("});");
                }
                self.line("for (auto& t : _threads) t.join();");
                self.indent -= 1;
                self.line("}");
            }
            Stmt::SocketSend { message, socket } => {
                let socket = self.gen_expr(socket);
                let message = self.gen_expr(message);
                self.line(&format!(
                    "{{ std::string _msg = {message}; send({socket}, _msg.c_str(), _msg.length(), 0); }}"
                ));
            }
            Stmt::Expr(e) => {
                let e = self.gen_expr(e);
                self.line(&format!("{e};"));
            }
            // Declarations never occur in statement position; the grammar
            // only produces them at the top level.
            Stmt::Function(_)
            | Stmt::Struct(_)
            | Stmt::Method(_)
            | Stmt::Decorator { .. }
            | Stmt::Test { .. } => {}
        }
    }

    // ── Expressions ──────────────────────────────────────────────────

    fn gen_expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Int(v) => v.to_string(),
            Expr::Float(v) => fmt_float(*v),
            Expr::Str(s) => gen_string(s),
            Expr::Bool(true) => "true".to_string(),
            Expr::Bool(false) => "false".to_string(),
            Expr::Ident(name) => name.clone(),
            Expr::MyField(field) => field.clone(),
            Expr::FieldAccess { object, field } => {
                format!("{}.{}", self.gen_expr(object), field)
            }
            Expr::Index { object, index } => {
                format!("{}[{}]", self.gen_expr(object), self.gen_expr(index))
            }
            Expr::Binary { op, lhs, rhs } => {
                format!("({} {} {})", self.gen_expr(lhs), op.cpp(), self.gen_expr(rhs))
            }
            Expr::Unary { op, operand } => {
                format!("({}{})", op.cpp(), self.gen_expr(operand))
            }
            Expr::Call { name, args } => {
                let args: Vec<String> = args.iter().map(|a| self.gen_expr(a)).collect();
                builtins::lower(name, &args)
                    .unwrap_or_else(|| format!("{}({})", name, args.join(", ")))
            }
            Expr::List(elements) => {
                let elems: Vec<String> = elements.iter().map(|e| self.gen_expr(e)).collect();
                format!("{{{}}}", elems.join(", "))
            }
            Expr::ListComp { expr, var, start, end, filter } => {
                self.gen_list_comp(expr, var, start, end.as_deref(), filter.as_deref())
            }
            Expr::Tuple(elements) => {
                let elems: Vec<String> = elements.iter().map(|e| self.gen_expr(e)).collect();
                format!("std::make_tuple({})", elems.join(", "))
            }
            Expr::Pipe { value, target } => {
                format!("{}({})", target, self.gen_expr(value))
            }
            Expr::Slice { object, start, end } => self.gen_slice(object, start.as_deref(), end.as_deref()),
            Expr::ReadFile(path) => {
                format!(
                    "[&]() {{ std::ifstream _f({}); std::stringstream _ss; _ss << _f.rdbuf(); return _ss.str(); }}()",
                    self.gen_expr(path)
                )
            }
            Expr::Ask(prompt) => match prompt {
                Some(p) => format!(
                    "[&]() {{ std::cout << {} << std::flush; std::string _input; std::getline(std::cin, _input); return _input; }}()",
                    self.gen_expr(p)
                ),
                None => "[&]() { std::string _input; std::getline(std::cin, _input); return _input; }()".to_string(),
            },
            Expr::Now => runtime::NOW.to_string(),
            Expr::Today => runtime::TODAY.to_string(),
            Expr::Clock => runtime::CLOCK.to_string(),
            Expr::Env(name) => {
                format!(
                    "[&]() {{ const char* _v = std::getenv({}); return _v ? std::string(_v) : std::string(); }}()",
                    self.gen_expr(name)
                )
            }
            Expr::RunCommand(command) => runtime::run_command(&self.gen_expr(command)),
            Expr::OpenFile(path) => format!("std::fstream({})", self.gen_expr(path)),
            Expr::Fetch(url) => runtime::fetch(&self.gen_expr(url)),
            Expr::JsonParse(value) => runtime::json_parse(&self.gen_expr(value)),
            Expr::JsonStringify(value) => runtime::json_stringify(&self.gen_expr(value)),
            Expr::RegexMatch { pattern, text } => {
                format!(
                    "std::regex_search({}, std::regex({}))",
                    self.gen_expr(text),
                    self.gen_expr(pattern)
                )
            }
            Expr::RegexFindAll { pattern, text } => {
                runtime::regex_find_all(&self.gen_expr(pattern), &self.gen_expr(text))
            }
            Expr::RegexReplace { pattern, text, replacement } => {
                format!(
                    "std::regex_replace({}, std::regex({}), {})",
                    self.gen_expr(text),
                    self.gen_expr(pattern),
                    self.gen_expr(replacement)
                )
            }
            Expr::Hash { algorithm, value } => runtime::hash(*algorithm, &self.gen_expr(value)),
            Expr::Wait(inner) => {
                format!(
                    "std::async(std::launch::async, [&]() {{ return {}; }}).get()",
                    self.gen_expr(inner)
                )
            }
            Expr::SocketConnect(url) => runtime::socket_connect(&self.gen_expr(url)),
        }
    }

    fn gen_slice(&self, object: &Expr, start: Option<&Expr>, end: Option<&Expr>) -> String {
        let obj = self.gen_expr(object);
        match (start, end) {
            (None, Some(end)) => {
                let end = self.gen_expr(end);
                format!("std::vector({obj}.begin(), {obj}.begin() + {end})")
            }
            (Some(start), None) => {
                let start = self.gen_expr(start);
                format!("std::vector({obj}.begin() + {start}, {obj}.end())")
            }
            (Some(start), Some(end)) => {
                let start = self.gen_expr(start);
                let end = self.gen_expr(end);
                format!("std::vector({obj}.begin() + {start}, {obj}.begin() + {end})")
            }
            (None, None) => obj,
        }
    }

    fn gen_list_comp(
        &self,
        expr: &Expr,
        var: &str,
        start: &Expr,
        end: Option<&Expr>,
        filter: Option<&Expr>,
    ) -> String {
        let mut out = String::from("[&]() { ");
        let expr_str = self.gen_expr(expr);

        match end {
            Some(end) => {
                // Bounded range: the loop variable and element type are int.
                let start = self.gen_expr(start);
                let end = self.gen_expr(end);
                out.push_str("std::vector<int> _result; ");
                out.push_str(&format!("for (int {var} = {start}; {var} <= {end}; {var}++) {{ "));
            }
            None => {
                // Collection source: element type deduced from the source.
                let collection = self.gen_expr(start);
                out.push_str(&format!(
                    "std::vector<std::decay_t<decltype(*std::begin({collection}))>> _result; "
                ));
                out.push_str(&format!("for (const auto& {var} : {collection}) {{ "));
            }
        }

        match filter {
            Some(cond) => {
                out.push_str(&format!("if ({}) {{ ", self.gen_expr(cond)));
                out.push_str(&format!("_result.push_back({expr_str}); "));
                out.push_str("} ");
            }
            None => {
                out.push_str(&format!("_result.push_back({expr_str}); "));
            }
        }

        out.push_str("} return _result; }()");
        out
    }

    // ── Output buffer ────────────────────────────────────────────────

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("    ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }
}

fn gen_params(params: &[String]) -> String {
    params
        .iter()
        .map(|p| format!("auto {p}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// A function whose body yields anywhere inside its direct or nested control
/// flow is a generator.
fn has_yield(stmts: &[Stmt]) -> bool {
    stmts.iter().any(|stmt| match stmt {
        Stmt::Yield(_) => true,
        Stmt::If { then_body, else_ifs, else_body, .. } => {
            has_yield(then_body)
                || has_yield(else_body)
                || else_ifs.iter().any(|e| has_yield(&e.body))
        }
        Stmt::ForEach { body, .. }
        | Stmt::Repeat { body, .. }
        | Stmt::While { body, .. }
        | Stmt::Using { body, .. } => has_yield(body),
        _ => false,
    })
}

fn cpp_type(ty: &str) -> &str {
    match ty {
        "text" => "std::string",
        "number" => "int",
        "decimal" => "double",
        "bool" | "yes/no" => "bool",
        other => other,
    }
}

fn fmt_float(v: f64) -> String {
    let s = format!("{v}");
    if s.contains('.') { s } else { format!("{s}.0") }
}

/// Escape a Flow string value for inclusion in a C++ string literal.
fn escape_cpp(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\0' => out.push_str("\\0"),
            other => out.push(other),
        }
    }
    out
}

/// A `{...}` span interpolates only when its content starts like an
/// identifier; spans of digits/commas (regex quantifiers and friends) stay
/// literal text, braces included.
fn is_interpolation(content: &str) -> bool {
    matches!(content.as_bytes().first(), Some(b) if b.is_ascii_alphabetic() || *b == b'_')
}

/// Lower a string literal, expanding `{name}` interpolations into an
/// ostringstream concatenation.
fn gen_string(s: &str) -> String {
    if !s.contains('{') {
        return format!("\"{}\"", escape_cpp(s));
    }

    let bytes = s.as_bytes();
    let mut parts: Vec<String> = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'{' {
            let mut j = i + 1;
            let mut depth = 1;
            while j < bytes.len() && depth > 0 {
                match bytes[j] {
                    b'{' => depth += 1,
                    b'}' => depth -= 1,
                    _ => {}
                }
                j += 1;
            }
            if depth == 0 {
                let content = &s[i + 1..j - 1];
                if is_interpolation(content) {
                    parts.push(content.to_string());
                } else {
                    parts.push(format!("\"{}\"", escape_cpp(&s[i..j])));
                }
                i = j;
            } else {
                // Unmatched brace stays literal
                parts.push(format!("\"{}\"", escape_cpp(&s[i..i + 1])));
                i += 1;
            }
        } else {
            let mut j = i;
            while j < bytes.len() && bytes[j] != b'{' {
                j += 1;
            }
            if j > i {
                parts.push(format!("\"{}\"", escape_cpp(&s[i..j])));
            }
            i = j;
        }
    }

    if parts.len() == 1 {
        return parts.remove(0);
    }

    let mut out = String::from("[&]() { std::ostringstream _ss; _ss");
    for part in &parts {
        out.push_str(" << ");
        out.push_str(part);
    }
    out.push_str("; return _ss.str(); }()");
    out
}
