//! The universe scope and the standard-library stubs.
//!
//! Stubs are ordinary Go-subset source: declarations only, enough for the
//! checker to type calls into the error utilities and the sentinel values
//! commonly compared against.

use crate::compiler::scope::{Builtin, ObjKind, Object, Objects, Scope};
use crate::compiler::tokens::Span;
use crate::compiler::types::{BasicKind, Interface, Signature, TypeKind, TypeTable};
use strum::IntoEnumIterator;

pub struct Universe {
    pub scope: Scope,
}

impl Universe {
    pub fn build(types: &mut TypeTable, objects: &mut Objects) -> Universe {
        let mut scope = Scope::new();
        let mut declare = |objects: &mut Objects, name: &str, kind: ObjKind, ty| {
            let id = objects.alloc(Object {
                name: name.to_string(),
                kind,
                ty,
                pkg: None,
                local: false,
                span: Span::dummy(),
            });
            scope.insert(name, id);
        };

        for kind in BasicKind::iter().filter(|k| k.is_predeclared()) {
            declare(objects, kind.name(), ObjKind::TypeName, types.basic(kind));
        }

        let string = types.basic(BasicKind::String);
        let error_sig = types.intern(TypeKind::Signature(Signature {
            params: vec![],
            results: vec![string],
            variadic: false,
        }));
        let error_iface = types.intern(TypeKind::Interface(Interface {
            methods: vec![("Error".into(), error_sig)],
            embeddeds: vec![],
        }));
        let error = types.new_named("error", None);
        types.set_underlying(error, error_iface);
        declare(objects, "error", ObjKind::TypeName, error);

        let any = types.empty_interface();
        declare(objects, "any", ObjKind::TypeName, any);
        let comparable = types.new_named("comparable", None);
        types.set_underlying(comparable, any);
        declare(objects, "comparable", ObjKind::TypeName, comparable);

        let untyped_bool = types.basic(BasicKind::UntypedBool);
        declare(objects, "true", ObjKind::Const, untyped_bool);
        declare(objects, "false", ObjKind::Const, untyped_bool);
        declare(objects, "iota", ObjKind::Const, types.basic(BasicKind::UntypedInt));
        declare(objects, "nil", ObjKind::Nil, types.basic(BasicKind::UntypedNil));

        for b in Builtin::iter() {
            declare(objects, b.name(), ObjKind::Builtin(b), TypeTable::INVALID);
        }

        Universe { scope }
    }
}

/// Import paths with a shipped stub.
pub const STUB_PATHS: &[&str] = &[
    "errors",
    "golang.org/x/xerrors",
    "golang.org/x/exp/errors",
    "os",
    "io",
    "io/fs",
    "fmt",
    "encoding/json",
    "context",
];

pub fn stub_source(path: &str) -> Option<&'static str> {
    Some(match path {
        "errors" => ERRORS,
        "golang.org/x/xerrors" => XERRORS,
        "golang.org/x/exp/errors" => EXP_ERRORS,
        "os" => OS,
        "io" => IO,
        "io/fs" => IO_FS,
        "fmt" => FMT,
        "encoding/json" => ENCODING_JSON,
        "context" => CONTEXT,
        _ => return None,
    })
}

/// Package name for an import path without a stub: its last element.
pub fn default_package_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

const ERRORS: &str = r#"
package errors

type errorString struct {
	s string
}

func (e *errorString) Error() string { return e.s }

func New(text string) error { return &errorString{text} }

func Is(err, target error) bool
func As(err error, target any) bool
func Unwrap(err error) error
func Join(errs ...error) error

var ErrUnsupported = New("unsupported operation")
"#;

const XERRORS: &str = r#"
package xerrors

type Wrapper interface {
	Unwrap() error
}

type Formatter interface {
	error
	FormatError(p Printer) (next error)
}

type Printer interface {
	Print(args ...any)
	Printf(format string, args ...any)
	Detail() bool
}

func New(text string) error
func Errorf(format string, a ...any) error
func Opaque(err error) error
func Is(err, target error) bool
func As(err error, target any) bool
func Unwrap(err error) error
"#;

const EXP_ERRORS: &str = r#"
package errors

type Wrapper interface {
	Unwrap() error
}

func New(text string) error
func Opaque(err error) error
func Is(err, target error) bool
func As(err error, target any) bool
func Unwrap(err error) error
"#;

const IO_FS: &str = r#"
package fs

import "errors"

var (
	ErrInvalid    = errors.New("invalid argument")
	ErrPermission = errors.New("permission denied")
	ErrExist      = errors.New("file already exists")
	ErrNotExist   = errors.New("file does not exist")
	ErrClosed     = errors.New("file already closed")
)

type FileMode uint32

type FileInfo interface {
	Name() string
	Size() int64
	Mode() FileMode
	IsDir() bool
	Sys() any
}

type PathError struct {
	Op   string
	Path string
	Err  error
}

func (e *PathError) Error() string
func (e *PathError) Unwrap() error
func (e *PathError) Timeout() bool
"#;

const IO: &str = r#"
package io

import "errors"

var (
	EOF              = errors.New("EOF")
	ErrUnexpectedEOF = errors.New("unexpected EOF")
	ErrShortWrite    = errors.New("short write")
	ErrClosedPipe    = errors.New("io: read/write on closed pipe")
)

type Reader interface {
	Read(p []byte) (n int, err error)
}

type Writer interface {
	Write(p []byte) (n int, err error)
}

type Closer interface {
	Close() error
}

type ReadCloser interface {
	Reader
	Closer
}

type ReadWriter interface {
	Reader
	Writer
}

func ReadAll(r Reader) ([]byte, error)
"#;

const OS: &str = r#"
package os

import (
	"errors"
	"io/fs"
)

var (
	ErrInvalid          = fs.ErrInvalid
	ErrPermission       = fs.ErrPermission
	ErrExist            = fs.ErrExist
	ErrNotExist         = fs.ErrNotExist
	ErrClosed           = fs.ErrClosed
	ErrProcessDone      = errors.New("os: process already finished")
	ErrDeadlineExceeded error
)

var Args []string

type PathError = fs.PathError

type FileMode = fs.FileMode

type File struct {
	name string
}

func (f *File) Close() error
func (f *File) Name() string
func (f *File) Read(b []byte) (n int, err error)
func (f *File) Write(b []byte) (n int, err error)

type SyscallError struct {
	Syscall string
	Err     error
}

func (e *SyscallError) Error() string
func (e *SyscallError) Unwrap() error

type LinkError struct {
	Op  string
	Old string
	New string
	Err error
}

func (e *LinkError) Error() string
func (e *LinkError) Unwrap() error

func Open(name string) (*File, error)
func Create(name string) (*File, error)
func ReadFile(name string) ([]byte, error)
func Getenv(key string) string
func Exit(code int)
"#;

const FMT: &str = r#"
package fmt

import "io"

type Stringer interface {
	String() string
}

type State interface {
	Write(b []byte) (n int, err error)
	Width() (wid int, ok bool)
	Precision() (prec int, ok bool)
	Flag(c int) bool
}

type Formatter interface {
	Format(f State, verb rune)
}

func Errorf(format string, a ...any) error
func Sprintf(format string, a ...any) string
func Sprint(a ...any) string
func Sprintln(a ...any) string
func Printf(format string, a ...any) (n int, err error)
func Println(a ...any) (n int, err error)
func Print(a ...any) (n int, err error)
func Fprintf(w io.Writer, format string, a ...any) (n int, err error)
func Fprintln(w io.Writer, a ...any) (n int, err error)
"#;

const ENCODING_JSON: &str = r#"
package json

type UnmarshalTypeError struct {
	Value  string
	Offset int64
	Struct string
	Field  string
}

func (e *UnmarshalTypeError) Error() string

type SyntaxError struct {
	msg    string
	Offset int64
}

func (e *SyntaxError) Error() string

type InvalidUnmarshalError struct {
	name string
}

func (e *InvalidUnmarshalError) Error() string

type MarshalerError struct {
	Err        error
	sourceFunc string
}

func (e *MarshalerError) Error() string
func (e *MarshalerError) Unwrap() error

type RawMessage []byte

type Number string

func Marshal(v any) ([]byte, error)
func Unmarshal(data []byte, v any) error
func Valid(data []byte) bool
"#;

const CONTEXT: &str = r#"
package context

import "errors"

var Canceled = errors.New("context canceled")

var DeadlineExceeded error = deadlineExceededError{}

type deadlineExceededError struct{}

func (deadlineExceededError) Error() string   { return "context deadline exceeded" }
func (deadlineExceededError) Timeout() bool   { return true }
func (deadlineExceededError) Temporary() bool { return true }

type Context interface {
	Done() <-chan struct{}
	Err() error
	Value(key any) any
}

type CancelFunc func()

func Background() Context
func TODO() Context
func WithCancel(parent Context) (ctx Context, cancel CancelFunc)
func Cause(c Context) error
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::lexer::Lexer;
    use crate::compiler::parser::Parser;

    #[test]
    fn every_stub_parses() {
        for path in STUB_PATHS {
            let src = stub_source(path).unwrap_or_default();
            let tokens = Lexer::new(src).tokenize().unwrap_or_else(|e| panic!("{}: {}", path, e));
            let file = Parser::new(tokens)
                .parse_file(path)
                .unwrap_or_else(|e| panic!("{}: {}", path, e));
            assert!(!file.decls.is_empty(), "{} has no declarations", path);
        }
    }

    #[test]
    fn universe_declares_predeclared_names() {
        let mut types = TypeTable::new();
        let mut objects = Objects::new();
        let universe = Universe::build(&mut types, &mut objects);
        for name in ["int", "string", "byte", "error", "any", "comparable", "nil", "true", "iota", "new", "make"] {
            assert!(universe.scope.contains(name), "missing {}", name);
        }
        assert!(!universe.scope.contains("unsafe.Pointer"));
        let new = universe.scope.get("new").and_then(|id| objects.get(id)).map(|o| o.kind.clone());
        assert_eq!(new, Some(ObjKind::Builtin(Builtin::New)));
        let error = universe.scope.get("error").and_then(|id| objects.get(id)).map(|o| o.ty);
        assert_eq!(error.map(|t| types.type_string(t, "")), Some("error".to_string()));
    }

    #[test]
    fn unknown_paths_fall_back_to_last_element() {
        assert!(stub_source("net/http").is_none());
        assert_eq!(default_package_name("net/http"), "http");
        assert_eq!(default_package_name("errors"), "errors");
    }
}
