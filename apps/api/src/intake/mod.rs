// Resume intake: uploaded document bytes → plain text → contact fields.
// The extractor only ever sees text that document extraction produced.

pub mod document;
pub mod fields;
