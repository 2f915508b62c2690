//! [`DocumentReader`] over an XML document parsed with `quick-xml`.
//!
//! The whole document is parsed up front into a flat arena of nodes, each
//! carrying its name, attributes, text, children and precomputed position.
//! Navigation afterwards is a stack of `(node, next child)` frames, so every
//! accessor is a cheap borrow.

use ahash::AHashMap;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use smallvec::SmallVec;

use super::DocumentReader;
use crate::error::{Error, Location};
use crate::options::ReferenceMode;
use crate::reader::attributes;

#[derive(Debug)]
struct Node {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<usize>,
    /// Absolute element path, `/a/b[2]`.
    xpath: String,
    /// Overrides `xpath` as the position key in id mode.
    id: Option<String>,
    location: Location,
}

#[derive(Clone, Copy, Debug)]
struct Frame {
    node: usize,
    next_child: usize,
}

/// Reader over an in-memory XML document.
///
/// ```rust
/// use graph_unmarshal::{DocumentReader, ReferenceMode, XmlReader};
///
/// let mut reader = XmlReader::from_str("<list><a/><a x=\"1\"/></list>", ReferenceMode::XPath).unwrap();
/// assert!(reader.move_down());
/// assert!(!reader.move_down());
/// reader.move_up();
/// assert!(reader.move_down());
/// assert_eq!(reader.current_path(), "/list/a[2]");
/// assert_eq!(reader.attribute("x"), Some("1"));
/// ```
#[derive(Debug)]
pub struct XmlReader {
    nodes: Vec<Node>,
    frames: SmallVec<[Frame; 16]>,
}

impl XmlReader {
    /// Parse `input` and position the cursor on the root element.
    pub fn from_str(input: &str, mode: ReferenceMode) -> Result<Self, Error> {
        let nodes = TreeBuilder::new(input, mode).build()?;
        let mut frames = SmallVec::new();
        frames.push(Frame {
            node: 0,
            next_child: 0,
        });
        Ok(Self { nodes, frames })
    }

    fn current(&self) -> &Node {
        // `frames` always holds the root frame; the arena is never empty.
        let frame = self.frames[self.frames.len() - 1];
        &self.nodes[frame.node]
    }
}

impl DocumentReader for XmlReader {
    fn node_name(&self) -> &str {
        &self.current().name
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.current()
            .attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn attribute_names(&self) -> Vec<&str> {
        self.current()
            .attributes
            .iter()
            .map(|(key, _)| key.as_str())
            .collect()
    }

    fn current_path(&self) -> &str {
        let node = self.current();
        node.id.as_deref().unwrap_or(&node.xpath)
    }

    fn value(&self) -> &str {
        &self.current().text
    }

    fn has_more_children(&self) -> bool {
        let frame = self.frames[self.frames.len() - 1];
        frame.next_child < self.nodes[frame.node].children.len()
    }

    fn move_down(&mut self) -> bool {
        let top = self.frames.len() - 1;
        let frame = self.frames[top];
        let Some(&child) = self.nodes[frame.node].children.get(frame.next_child) else {
            return false;
        };
        self.frames[top].next_child += 1;
        self.frames.push(Frame {
            node: child,
            next_child: 0,
        });
        true
    }

    fn move_up(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    fn location(&self) -> Location {
        self.current().location
    }
}

/// Builds the node arena from `quick-xml` events.
struct TreeBuilder<'a> {
    input: &'a str,
    mode: ReferenceMode,
    line_starts: Vec<usize>,
    nodes: Vec<Node>,
    /// Open elements with per-name child counters used for `[n]` suffixes.
    open: Vec<(usize, AHashMap<String, usize>)>,
}

impl<'a> TreeBuilder<'a> {
    fn new(input: &'a str, mode: ReferenceMode) -> Self {
        let line_starts = std::iter::once(0)
            .chain(input.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            input,
            mode,
            line_starts,
            nodes: Vec::new(),
            open: Vec::new(),
        }
    }

    fn location_at(&self, offset: usize) -> Location {
        let offset = offset.min(self.input.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        let line_start = self.line_starts[line];
        let column = self
            .input
            .get(line_start..offset)
            .map_or(0, |prefix| prefix.chars().count());
        Location::new(line + 1, column + 1, offset)
    }

    fn build(mut self) -> Result<Vec<Node>, Error> {
        // Text is kept raw and trimmed once per element, so whitespace between
        // text, CDATA and comments survives inside the content.
        let mut reader = Reader::from_str(self.input);

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    let location = self.location_at(reader.buffer_position() as usize);
                    return Err(Error::xml(e.to_string()).with_location(location));
                }
            };
            let end = reader.buffer_position() as usize;
            match event {
                Event::Start(e) => {
                    let start = end.saturating_sub(e.len() + 2);
                    let idx = self.open_element(&e, start)?;
                    self.open.push((idx, AHashMap::new()));
                }
                Event::Empty(e) => {
                    let start = end.saturating_sub(e.len() + 3);
                    self.open_element(&e, start)?;
                }
                Event::End(_) => {
                    if let Some((idx, _)) = self.open.pop() {
                        trim_in_place(&mut self.nodes[idx].text);
                    }
                }
                Event::Text(t) => {
                    let text = t
                        .unescape()
                        .map_err(|e| Error::xml(e.to_string()).with_location(self.location_at(end)))?;
                    self.push_text(&text, end)?;
                }
                Event::CData(c) => {
                    let text = String::from_utf8_lossy(&c).into_owned();
                    self.push_text(&text, end)?;
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions and doctypes carry no data.
                _ => {}
            }
        }

        if let Some((idx, _)) = self.open.last() {
            let node = &self.nodes[*idx];
            return Err(Error::xml(format!("element `{}` is not closed", node.name))
                .with_location(node.location));
        }
        if self.nodes.is_empty() {
            return Err(Error::xml("document has no root element"));
        }
        Ok(self.nodes)
    }

    fn push_text(&mut self, text: &str, offset: usize) -> Result<(), Error> {
        match self.open.last() {
            Some((idx, _)) => {
                self.nodes[*idx].text.push_str(text);
                Ok(())
            }
            None if text.trim().is_empty() => Ok(()),
            None => Err(Error::xml("text outside of the root element")
                .with_location(self.location_at(offset))),
        }
    }

    fn open_element(&mut self, e: &BytesStart<'_>, start: usize) -> Result<usize, Error> {
        let location = self.location_at(start);
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();

        let mut attrs = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| Error::xml(err.to_string()).with_location(location))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|err| Error::xml(err.to_string()).with_location(location))?
                .into_owned();
            attrs.push((key, value));
        }

        let xpath = match self.open.last_mut() {
            Some((parent, counts)) => {
                let count = counts.entry(name.clone()).or_insert(0);
                *count += 1;
                let parent_path = &self.nodes[*parent].xpath;
                if *count > 1 {
                    format!("{parent_path}/{name}[{count}]")
                } else {
                    format!("{parent_path}/{name}")
                }
            }
            None if !self.nodes.is_empty() => {
                return Err(Error::xml("document has more than one root element").with_location(location));
            }
            None => format!("/{name}"),
        };

        let id = match self.mode {
            ReferenceMode::Id => attrs
                .iter()
                .find(|(key, _)| key == attributes::ID)
                .map(|(_, value)| value.clone()),
            ReferenceMode::XPath => None,
        };
        // Paths of nodes without an id share the key space.
        if let Some(id) = id.as_deref().filter(|id| id.starts_with('/')) {
            return Err(Error::xml(format!(
                "id `{id}` of element `{name}` starts with `/` and could collide with a path"
            ))
            .with_location(location));
        }

        let idx = self.nodes.len();
        if let Some((parent, _)) = self.open.last() {
            self.nodes[*parent].children.push(idx);
        }
        self.nodes.push(Node {
            name,
            attributes: attrs,
            text: String::new(),
            children: Vec::new(),
            xpath,
            id,
            location,
        });
        Ok(idx)
    }
}

fn trim_in_place(text: &mut String) {
    let trimmed = text.trim();
    if trimmed.len() != text.len() {
        *text = trimmed.to_owned();
    }
}
