// MathML to OMML conversion
//
// The converter is a pluggable black box behind `MathmlToOmml`. The built-in
// implementation maps MathML structure to OMML structure one to one, the way
// a generic stylesheet-based converter does: operator runs stay runs, large
// operators with limits get an empty integrand slot, and unknown styles leak
// through as `undefined`. The repair passes clean up after it.

use super::build;
use super::lookup::{MATHVARIANT_SCRIPTS, MATHVARIANT_STYLES, NARY_CHARS};
use crate::common::xml::{NodeId, OMML_NS, XmlTree};
use crate::formula::error::{FormulaError, Result};

/// Converts one MathML `<math>` element into an OMML string.
///
/// Output is an `<m:oMath>` (or `<m:oMathPara>`) element; namespace
/// declarations and wrappers are allowed and removed by the repairer.
pub trait MathmlToOmml {
    fn convert(&self, mathml: &str) -> Result<String>;
}

impl<F> MathmlToOmml for F
where
    F: Fn(&str) -> Result<String>,
{
    fn convert(&self, mathml: &str) -> Result<String> {
        self(mathml)
    }
}

/// Structural MathML to OMML converter.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinConverter;

impl MathmlToOmml for BuiltinConverter {
    fn convert(&self, mathml: &str) -> Result<String> {
        let input = XmlTree::parse_fragment(mathml, "mathml-input", &[])?;
        let math = input
            .descendants(input.root())
            .into_iter()
            .find(|&n| local_name(&input, n) == Some("math"))
            .unwrap_or_else(|| input.root());
        let display = input.attr(math, "display") == Some("block");

        let mut out = XmlTree::new("omml-output");
        let omath = out.create_element("m:oMath");
        let mut builder = Builder {
            input: &input,
            out: &mut out,
        };
        builder.children_into(math, omath)?;

        if out.children(omath).is_empty() {
            return Err(FormulaError::Convert("MathML produced no OMML content".to_string()));
        }

        let top = if display {
            build::element(&mut out, "m:oMathPara", &[omath])
        } else {
            omath
        };
        out.set_attr(top, "xmlns:m", OMML_NS);
        let root = out.root();
        out.append(root, top);
        Ok(out.serialize(top))
    }
}

fn local_name(tree: &XmlTree, node: NodeId) -> Option<&str> {
    tree.element(node).map(|e| e.local_name())
}

struct Builder<'a> {
    input: &'a XmlTree,
    out: &'a mut XmlTree,
}

impl Builder<'_> {
    /// Emit every child of `node` into `parent`.
    fn children_into(&mut self, node: NodeId, parent: NodeId) -> Result<()> {
        let input = self.input;
        for &child in input.children(node) {
            self.emit(child, parent)?;
        }
        Ok(())
    }

    /// Emit one MathML node into `parent`.
    fn emit(&mut self, node: NodeId, parent: NodeId) -> Result<()> {
        let input = self.input;
        if let Some(text) = input.text(node) {
            if !text.trim().is_empty() {
                let r = build::run(self.out, text.trim(), None);
                self.out.append(parent, r);
            }
            return Ok(());
        }

        let name = local_name(input, node).unwrap_or_default();
        match name {
            "math" | "mrow" | "mstyle" | "mpadded" | "merror" | "maction" => {
                self.children_into(node, parent)
            },
            "semantics" => match input.element_children(node).first() {
                Some(&first) => self.emit(first, parent),
                None => Ok(()),
            },
            "annotation" | "annotation-xml" | "none" | "mprescripts" => Ok(()),
            "mi" | "mn" | "mo" | "mtext" | "ms" => {
                self.token(node, name, parent);
                Ok(())
            },
            "mspace" => {
                if input.attr(node, "width").is_some_and(is_positive_length) {
                    let r = build::run(self.out, " ", None);
                    self.out.append(parent, r);
                }
                Ok(())
            },
            "mfrac" => self.fraction(node, parent),
            "msqrt" => {
                let deg_hide = build::property(self.out, "m:degHide", "1");
                let pr = build::element(self.out, "m:radPr", &[deg_hide]);
                let deg = self.out.create_element("m:deg");
                let e = self.out.create_element("m:e");
                self.children_into(node, e)?;
                let rad = build::element(self.out, "m:rad", &[pr, deg, e]);
                self.out.append(parent, rad);
                Ok(())
            },
            "mroot" => {
                let [base, index] = self.args::<2>(node, name)?;
                let deg = self.slot_of("m:deg", index)?;
                let e = self.slot_of("m:e", base)?;
                let rad = build::element(self.out, "m:rad", &[deg, e]);
                self.out.append(parent, rad);
                Ok(())
            },
            "msub" | "msup" | "msubsup" => self.script(node, name, parent),
            "munder" | "mover" | "munderover" => self.under_over(node, name, parent),
            "mtable" => self.table(node, parent),
            "mfenced" => self.fenced(node, parent),
            "menclose" => self.wrapped("m:borderBox", node, parent),
            "mphantom" => self.wrapped("m:phant", node, parent),
            "mmultiscripts" => self.multiscripts(node, parent),
            _ => self.children_into(node, parent),
        }
    }

    /// The first `N` element children, in order.
    fn args<const N: usize>(&self, node: NodeId, name: &str) -> Result<[NodeId; N]> {
        let children = self.input.element_children(node);
        children.get(..N).and_then(|s| <[NodeId; N]>::try_from(s).ok()).ok_or_else(|| {
            FormulaError::Convert(format!("<{name}> needs {N} arguments, found {}", children.len()))
        })
    }

    /// A new slot element holding the conversion of `node`.
    fn slot_of(&mut self, slot: &str, node: NodeId) -> Result<NodeId> {
        let s = self.out.create_element(slot);
        self.emit(node, s)?;
        Ok(s)
    }

    fn token(&mut self, node: NodeId, name: &str, parent: NodeId) {
        let text = self.input.text_content(node);
        if text.is_empty() {
            return;
        }
        let variant = self.input.attr(node, "mathvariant");
        let r = self.out.create_element("m:r");

        let mut props = Vec::new();
        match variant {
            Some(v) => {
                if let Some(scr) = MATHVARIANT_SCRIPTS.get(v) {
                    props.push(build::property(self.out, "m:scr", scr));
                    if v.starts_with("bold") {
                        props.push(build::property(self.out, "m:sty", "b"));
                    }
                } else {
                    let sty = MATHVARIANT_STYLES.get(v).copied().unwrap_or("undefined");
                    props.push(build::property(self.out, "m:sty", sty));
                }
            },
            None if name == "mtext" || (name == "mi" && text.chars().count() > 1) => {
                props.push(build::property(self.out, "m:sty", "p"));
            },
            None => {},
        }
        if !props.is_empty() {
            let rpr = build::element(self.out, "m:rPr", &props);
            self.out.append(r, rpr);
        }
        let t = build::text_element(self.out, &text);
        self.out.append(r, t);
        self.out.append(parent, r);
    }

    fn fraction(&mut self, node: NodeId, parent: NodeId) -> Result<()> {
        let [num, den] = self.args::<2>(node, "mfrac")?;
        let f = self.out.create_element("m:f");

        let thickness = self.input.attr(node, "linethickness").unwrap_or_default();
        let no_bar = !thickness.is_empty() && !is_positive_length(thickness);
        let bevelled = self.input.attr(node, "bevelled") == Some("true");
        if no_bar || bevelled {
            let ty = build::property(self.out, "m:type", if bevelled { "skw" } else { "noBar" });
            let pr = build::element(self.out, "m:fPr", &[ty]);
            self.out.append(f, pr);
        }

        let num = self.slot_of("m:num", num)?;
        let den = self.slot_of("m:den", den)?;
        self.out.append(f, num);
        self.out.append(f, den);
        self.out.append(parent, f);
        Ok(())
    }

    /// Large-operator character of a script base, if it is one.
    fn nary_base(&self, base: NodeId) -> Option<String> {
        let mut node = base;
        while local_name(self.input, node) == Some("mrow") {
            match self.input.element_children(node).as_slice() {
                [only] => node = *only,
                _ => return None,
            }
        }
        if !matches!(local_name(self.input, node), Some("mo" | "mi")) {
            return None;
        }
        let text = self.input.text_content(node);
        let text = text.trim();
        NARY_CHARS.contains(text).then(|| text.to_string())
    }

    fn script(&mut self, node: NodeId, name: &str, parent: NodeId) -> Result<()> {
        let children = self.input.element_children(node);
        let need = if name == "msubsup" { 3 } else { 2 };
        if children.len() < need {
            return Err(FormulaError::Convert(format!(
                "<{name}> needs {need} arguments, found {}",
                children.len()
            )));
        }
        let base = children[0];
        let (sub, sup) = match name {
            "msub" => (Some(children[1]), None),
            "msup" => (None, Some(children[1])),
            _ => (Some(children[1]), Some(children[2])),
        };

        if let Some(chr) = self.nary_base(base) {
            let n = self.nary(&chr, "subSup", sub, sup)?;
            self.out.append(parent, n);
            return Ok(());
        }

        let (element, slots): (&str, Vec<(&str, NodeId)>) = match (sub, sup) {
            (Some(sub), None) => ("m:sSub", vec![("m:e", base), ("m:sub", sub)]),
            (None, Some(sup)) => ("m:sSup", vec![("m:e", base), ("m:sup", sup)]),
            (Some(sub), Some(sup)) => (
                "m:sSubSup",
                vec![("m:e", base), ("m:sub", sub), ("m:sup", sup)],
            ),
            (None, None) => return self.emit(base, parent),
        };
        let s = self.out.create_element(element);
        for (slot, arg) in slots {
            let slot = self.slot_of(slot, arg)?;
            self.out.append(s, slot);
        }
        self.out.append(parent, s);
        Ok(())
    }

    fn nary(
        &mut self,
        chr: &str,
        lim_loc: &str,
        sub: Option<NodeId>,
        sup: Option<NodeId>,
    ) -> Result<NodeId> {
        let sub_nodes = match sub {
            Some(s) => Some(self.converted(s)?),
            None => None,
        };
        let sup_nodes = match sup {
            Some(s) => Some(self.converted(s)?),
            None => None,
        };
        Ok(build::nary(
            self.out,
            chr,
            lim_loc,
            sub_nodes.as_deref(),
            sup_nodes.as_deref(),
            &[],
        ))
    }

    /// Converted nodes of `node`, detached and in order.
    fn converted(&mut self, node: NodeId) -> Result<Vec<NodeId>> {
        let holder = self.out.create_element("holder");
        self.emit(node, holder)?;
        Ok(self.out.children(holder).to_vec())
    }

    fn under_over(&mut self, node: NodeId, name: &str, parent: NodeId) -> Result<()> {
        let children = self.input.element_children(node);
        let need = if name == "munderover" { 3 } else { 2 };
        if children.len() < need {
            return Err(FormulaError::Convert(format!(
                "<{name}> needs {need} arguments, found {}",
                children.len()
            )));
        }
        let base = children[0];
        let (under, over) = match name {
            "munder" => (Some(children[1]), None),
            "mover" => (None, Some(children[1])),
            _ => (Some(children[1]), Some(children[2])),
        };

        if let Some(chr) = self.nary_base(base) {
            let n = self.nary(&chr, "undOvr", under, over)?;
            self.out.append(parent, n);
            return Ok(());
        }

        if let (None, Some(over)) = (under, over)
            && self.input.attr(node, "accent") == Some("true")
        {
            let chr = self.input.text_content(over);
            let chr = build::property(self.out, "m:chr", chr.trim());
            let pr = build::element(self.out, "m:accPr", &[chr]);
            let e = self.slot_of("m:e", base)?;
            let acc = build::element(self.out, "m:acc", &[pr, e]);
            self.out.append(parent, acc);
            return Ok(());
        }

        let mut current = self.slot_of("m:e", base)?;
        if let Some(under) = under {
            let lim = self.slot_of("m:lim", under)?;
            let low = build::element(self.out, "m:limLow", &[current, lim]);
            current = build::slot(self.out, "m:e", &[low]);
        }
        if let Some(over) = over {
            let lim = self.slot_of("m:lim", over)?;
            let upp = build::element(self.out, "m:limUpp", &[current, lim]);
            current = build::slot(self.out, "m:e", &[upp]);
        }
        // `current` is an m:e holding the outermost construct
        self.out.move_children(current, parent);
        Ok(())
    }

    fn table(&mut self, node: NodeId, parent: NodeId) -> Result<()> {
        let input = self.input;
        let rows: Vec<NodeId> = input
            .element_children(node)
            .into_iter()
            .filter(|&r| matches!(local_name(input, r), Some("mtr" | "mlabeledtr")))
            .collect();

        let m = self.out.create_element("m:m");
        let mut max_cols = 0usize;
        let mut row_nodes = Vec::with_capacity(rows.len());
        for row in rows {
            let mut cells = input.element_children(row);
            if local_name(input, row) == Some("mlabeledtr") && !cells.is_empty() {
                cells.remove(0);
            }
            max_cols = max_cols.max(cells.len());
            let mr = self.out.create_element("m:mr");
            for cell in cells {
                let e = self.out.create_element("m:e");
                if local_name(input, cell) == Some("mtd") {
                    self.children_into(cell, e)?;
                } else {
                    self.emit(cell, e)?;
                }
                self.out.append(mr, e);
            }
            row_nodes.push(mr);
        }

        let count = build::property(self.out, "m:count", &max_cols.max(1).to_string());
        let jc = build::property(self.out, "m:mcJc", "center");
        let mc_pr = build::element(self.out, "m:mcPr", &[count, jc]);
        let mc = build::element(self.out, "m:mc", &[mc_pr]);
        let mcs = build::element(self.out, "m:mcs", &[mc]);
        let m_pr = build::element(self.out, "m:mPr", &[mcs]);
        self.out.append(m, m_pr);
        for mr in row_nodes {
            self.out.append(m, mr);
        }
        self.out.append(parent, m);
        Ok(())
    }

    fn fenced(&mut self, node: NodeId, parent: NodeId) -> Result<()> {
        let open = self.input.attr(node, "open").unwrap_or("(").to_string();
        let close = self.input.attr(node, "close").unwrap_or(")").to_string();
        let beg = build::property(self.out, "m:begChr", &open);
        let end = build::property(self.out, "m:endChr", &close);
        let pr = build::element(self.out, "m:dPr", &[beg, end]);
        let d = build::element(self.out, "m:d", &[pr]);
        for child in self.input.element_children(node) {
            let e = self.slot_of("m:e", child)?;
            self.out.append(d, e);
        }
        self.out.append(parent, d);
        Ok(())
    }

    fn wrapped(&mut self, name: &str, node: NodeId, parent: NodeId) -> Result<()> {
        let e = self.out.create_element("m:e");
        self.children_into(node, e)?;
        let w = build::element(self.out, name, &[e]);
        self.out.append(parent, w);
        Ok(())
    }

    fn multiscripts(&mut self, node: NodeId, parent: NodeId) -> Result<()> {
        let children = self.input.element_children(node);
        let Some((&base, rest)) = children.split_first() else {
            return Ok(());
        };
        let post: Vec<NodeId> = rest
            .iter()
            .copied()
            .take_while(|&c| local_name(self.input, c) != Some("mprescripts"))
            .collect();
        if post.len() < 2 {
            return self.emit(base, parent);
        }
        let e = self.slot_of("m:e", base)?;
        let sub = self.slot_of("m:sub", post[0])?;
        let sup = self.slot_of("m:sup", post[1])?;
        let s = build::element(self.out, "m:sSubSup", &[e, sub, sup]);
        self.out.append(parent, s);
        Ok(())
    }
}

/// Whether a MathML length is strictly positive (`0.2em`, `3pt`, `thin`).
fn is_positive_length(value: &str) -> bool {
    let value = value.trim();
    let number: String = value
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '-' || *c == '+')
        .collect();
    if number.is_empty() {
        return matches!(
            value,
            "thin" | "medium" | "thick" | "verythinmathspace" | "thinmathspace"
                | "mediummathspace" | "thickmathspace" | "verythickmathspace"
        );
    }
    number.parse::<f64>().is_ok_and(|n| n > 0.0)
}
